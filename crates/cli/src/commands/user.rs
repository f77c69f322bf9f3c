//! User management commands.
//!
//! Each command goes through the service layer, so CLI writes observe the
//! same validation and duplicate handling as the HTTP API.

use thiserror::Error;

use roster_core::{NewUserInput, UserId, UserStatus};
use roster_server::config::{AppConfig, ConfigError};
use roster_server::db::{Database, RepositoryError};
use roster_server::services::{UserService, UserServiceError};

/// Errors that can occur while running user commands.
#[derive(Debug, Error)]
pub enum UserCommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("{0}")]
    Service(#[from] UserServiceError),

    #[error("invalid status filter: {0} (expected 'active' or 'inactive')")]
    InvalidStatus(String),
}

async fn connect() -> Result<Database, UserCommandError> {
    let config = AppConfig::from_env()?;
    Ok(Database::connect(&config).await?)
}

/// Create a user.
///
/// # Errors
///
/// Returns [`UserCommandError`] if validation fails, the email is taken,
/// or the database is unreachable.
pub async fn create(name: &str, email: &str) -> Result<(), UserCommandError> {
    let database = connect().await?;
    let service = UserService::new(database.pool());

    let user = service
        .create_user(NewUserInput {
            name: name.to_owned(),
            email: email.to_owned(),
            status: None,
        })
        .await?;

    tracing::info!(id = %user.id, email = %user.email, "user created");
    Ok(())
}

/// List users; active only unless `all` is set.
///
/// # Errors
///
/// Returns [`UserCommandError`] if the database is unreachable.
pub async fn list(all: bool) -> Result<(), UserCommandError> {
    let database = connect().await?;
    let service = UserService::new(database.pool());

    let users = service.list_users(all).await?;

    #[allow(clippy::print_stdout)]
    for user in &users {
        println!(
            "{:>6}  {:<10}  {:<30}  {}",
            user.id,
            user.status,
            user.email,
            user.name
        );
    }
    tracing::info!(count = users.len(), "users listed");
    Ok(())
}

/// Deactivate a user by id.
///
/// # Errors
///
/// Returns [`UserCommandError`] if no row was affected or the database is
/// unreachable.
pub async fn deactivate(id: i32) -> Result<(), UserCommandError> {
    let database = connect().await?;
    let service = UserService::new(database.pool());

    service.deactivate_user(UserId::new(id)).await?;

    tracing::info!(id, "user deactivated");
    Ok(())
}

/// Count users, optionally scoped to one status.
///
/// # Errors
///
/// Returns [`UserCommandError`] for an unknown status filter or an
/// unreachable database.
pub async fn count(status: Option<&str>) -> Result<(), UserCommandError> {
    let filter = status
        .map(|raw| {
            raw.parse::<UserStatus>()
                .map_err(|_| UserCommandError::InvalidStatus(raw.to_owned()))
        })
        .transpose()?;

    let database = connect().await?;
    let service = UserService::new(database.pool());

    let count = service.count_users(filter).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{count}");
    }
    Ok(())
}
