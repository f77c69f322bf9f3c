//! Database access for Roster `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - the sole entity; soft delete is a status transition
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p roster-cli -- migrate
//! ```
//!
//! # Lifecycle
//!
//! The pool is owned by a [`Database`] value that `main` (or a test
//! harness) creates and passes down by reference - there is no global
//! singleton. Initial connectivity is validated with exponential-backoff
//! retries; shutdown drains the pool within a configured grace period.

pub mod error;
pub mod users;

pub use error::{ErrorKind, RepositoryError};
pub use users::UserRepository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;

/// Embedded migrations for the users schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Delay before the first reconnection attempt; doubles per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Ceiling for the exponential backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// How long a single pool checkout may wait before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide database handle owning the connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database described by the configuration.
    ///
    /// The pool itself is created lazily; connectivity is then validated
    /// with a trivial round trip, retried with exponential backoff up to
    /// `config.db_connect_attempts` times. Exceeding the ceiling surfaces
    /// the last failure as fatal.
    ///
    /// # Errors
    ///
    /// Returns a `Connection`-kind [`RepositoryError`] if the URL is
    /// invalid or the database stays unreachable through every attempt.
    pub async fn connect(config: &AppConfig) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.environment.max_connections())
            .min_connections(config.environment.min_connections())
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(config.database_url.expose_secret())
            .map_err(|e| RepositoryError::from_sqlx("connect", e))?;

        let database = Self { pool };
        database
            .validate_with_retry(config.db_connect_attempts)
            .await?;
        Ok(database)
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Single trivial round-trip query.
    ///
    /// Used by the readiness probe and by connect-time validation. A
    /// failure here never mutates pool state by itself; the pool keeps
    /// re-establishing connections on demand.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the round trip fails.
    pub async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| RepositoryError::from_sqlx("health_check", e))
    }

    /// Drain and close the pool, waiting at most `grace`.
    ///
    /// When the grace period elapses with checkouts still outstanding the
    /// remaining connections are abandoned to process teardown.
    pub async fn close(&self, grace: Duration) {
        if tokio::time::timeout(grace, self.pool.close()).await.is_err() {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "database pool did not drain within the grace period"
            );
        } else {
            tracing::info!("database pool closed");
        }
    }

    /// Validate connectivity, retrying with exponential backoff.
    async fn validate_with_retry(&self, attempts: u32) -> Result<(), RepositoryError> {
        let attempts = attempts.max(1);
        let mut delay = INITIAL_BACKOFF;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.health_check().await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "database connection established after retry");
                    }
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "database connection failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_BACKOFF);
                }
                Err(err) => {
                    tracing::error!(
                        attempts,
                        error = %err,
                        "database connection failed; giving up"
                    );
                    return Err(err.with_operation("connect"));
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_constants_are_sane() {
        assert!(INITIAL_BACKOFF < MAX_BACKOFF);
        assert!(ACQUIRE_TIMEOUT > Duration::ZERO);
    }

    #[test]
    fn test_migrator_embeds_users_migration() {
        assert!(!MIGRATOR.migrations.is_empty());
        assert!(
            MIGRATOR
                .migrations
                .iter()
                .any(|m| m.description.contains("users"))
        );
    }
}
