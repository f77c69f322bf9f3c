//! HTTP route handlers for the server.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health            - Liveness check
//! GET    /health/ready      - Readiness check (verifies database)
//!
//! # Users
//! POST   /users             - Create a user
//! GET    /users             - List users (active only by default)
//! GET    /users/count       - Count users
//! GET    /users/{id}        - Fetch a user
//! PATCH  /users/{id}        - Partially update a user
//! DELETE /users/{id}        - Deactivate a user (soft delete)
//! ```

pub mod health;
pub mod users;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/users", users::routes())
}
