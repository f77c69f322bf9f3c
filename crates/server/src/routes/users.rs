//! User route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roster_core::{NewUserInput, User, UserId, UserPatchInput, UserStatus};

use crate::error::{AppError, Result};
use crate::services::UserService;
use crate::state::AppState;

/// Create the user routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(index))
        .route("/count", get(count))
        .route("/{id}", get(show).patch(update).delete(deactivate))
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

/// User representation returned to clients.
#[derive(Debug, Serialize)]
pub struct UserBody {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            name: user.name.into_inner(),
            email: user.email.into_inner(),
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Query parameters for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Include inactive users in the listing.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Query parameters for the count endpoint.
#[derive(Debug, Deserialize)]
pub struct CountQuery {
    /// Restrict the count to one status.
    pub status: Option<UserStatus>,
}

/// Response body for the count endpoint.
#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /users` - create a user.
async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewUserInput>,
) -> Result<(StatusCode, Json<UserBody>)> {
    let service = UserService::new(state.pool());
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `GET /users` - list users; active only unless `include_inactive=true`.
async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UserBody>>> {
    let service = UserService::new(state.pool());
    let users = service.list_users(query.include_inactive).await?;
    Ok(Json(users.into_iter().map(UserBody::from).collect()))
}

/// `GET /users/count` - count users, optionally scoped by status.
async fn count(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<CountBody>> {
    let service = UserService::new(state.pool());
    let count = service.count_users(query.status).await?;
    Ok(Json(CountBody { count }))
}

/// `GET /users/{id}` - fetch a user.
async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<UserBody>> {
    let service = UserService::new(state.pool());
    let user = service.get_user(UserId::new(id)).await?;
    Ok(Json(user.into()))
}

/// `PATCH /users/{id}` - partially update a user.
///
/// The empty patch is rejected here with 400 to avoid surprising writes;
/// the repository itself treats it as a valid no-op update.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UserPatchInput>,
) -> Result<Json<UserBody>> {
    if input.name.is_none() && input.email.is_none() && input.status.is_none() {
        return Err(AppError::BadRequest("empty update".to_owned()));
    }

    let service = UserService::new(state.pool());
    let user = service.update_user(UserId::new(id), input).await?;
    Ok(Json(user.into()))
}

/// `DELETE /users/{id}` - deactivate a user (soft delete).
async fn deactivate(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    let service = UserService::new(state.pool());
    service.deactivate_user(UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
