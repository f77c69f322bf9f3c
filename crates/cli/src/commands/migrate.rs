//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! roster-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ROSTER_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection
//!   string
//!
//! Migration files live in `crates/server/migrations/` and are embedded
//! into the binary at compile time.

use thiserror::Error;

use roster_server::config::{AppConfig, ConfigError};
use roster_server::db::{Database, MIGRATOR, RepositoryError};

/// Errors that can occur while running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns [`MigrationError`] if configuration is missing, the database
/// is unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let database = Database::connect(&config).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(database.pool()).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
