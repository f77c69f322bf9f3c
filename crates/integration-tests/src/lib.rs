//! Integration test support for Roster.
//!
//! # Running Tests
//!
//! The DB-backed tests are `#[ignore]`d by default so the suite passes
//! without infrastructure. To run them:
//!
//! ```bash
//! # Point at an isolated test database
//! export TEST_DATABASE_URL=postgres://localhost/roster_test
//!
//! # Run everything, including ignored tests
//! cargo test -p roster-integration-tests -- --include-ignored
//! ```
//!
//! Migrations run automatically before the first connection is handed out.
//!
//! # Test Hygiene
//!
//! - [`unique_email`] generates collision-free addresses so tests can run
//!   concurrently against one shared database.
//! - [`with_rollback`] runs arbitrary repository logic inside a
//!   transaction that is always rolled back: the closure's value is
//!   returned, its effects are discarded, and errors propagate unchanged
//!   (there is no sentinel error to filter out).
//! - Tests that do commit clean up after themselves via the repository's
//!   hard-delete helper.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use roster_server::db::{MIGRATOR, RepositoryError};

/// Connect to the test database and run migrations.
///
/// Reads `TEST_DATABASE_URL`, falling back to `ROSTER_DATABASE_URL` and
/// then `DATABASE_URL`.
///
/// # Panics
///
/// Panics with a descriptive message when no database URL is configured
/// or the database is unreachable; the calling tests are `#[ignore]`d, so
/// this only fires when explicitly opted in.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("ROSTER_DATABASE_URL"))
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("set TEST_DATABASE_URL to run database integration tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to the test database");

    MIGRATOR
        .run(&pool)
        .await
        .expect("failed to run migrations on the test database");

    pool
}

/// Base URL for the HTTP API tests (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("ROSTER_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

static EMAIL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate an email address unique across tests and processes.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let n = EMAIL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{n}-{nanos}@test.invalid", std::process::id())
}

/// Run `op` inside a transaction that is always rolled back.
///
/// The closure's value is returned and its effects are discarded, whether
/// it succeeds or fails. Errors from the closure propagate unchanged.
///
/// # Errors
///
/// Returns the closure's error, or the classified [`RepositoryError`] if
/// beginning or rolling back the transaction fails.
pub async fn with_rollback<T, F>(pool: &PgPool, op: F) -> Result<T, RepositoryError>
where
    F: for<'t> FnOnce(&'t mut PgConnection) -> BoxFuture<'t, Result<T, RepositoryError>>,
{
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| RepositoryError::from_sqlx("begin", e))?;

    let result = op(&mut *tx).await;

    if let Err(rollback_err) = tx.rollback().await {
        return Err(RepositoryError::from_sqlx("rollback", rollback_err));
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_email_is_unique() {
        let a = unique_email("t");
        let b = unique_email("t");
        assert_ne!(a, b);
    }

    #[test]
    fn test_unique_email_is_parseable() {
        let email = roster_core::Email::parse(&unique_email("Check")).unwrap();
        assert!(email.as_str().ends_with("@test.invalid"));
    }
}
