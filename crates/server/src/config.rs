//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ROSTER_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to the generic `DATABASE_URL`)
//!
//! ## Optional
//! - `TEST_DATABASE_URL` - separate connection string for the isolated
//!   test database (consumed by the integration-test harness)
//! - `APP_ENV` - `development`, `test`, or `production` (default: production);
//!   drives pool sizing and the default log filter
//! - `ROSTER_HOST` - Bind address (default: 127.0.0.1)
//! - `ROSTER_PORT` - Listen port (default: 3000)
//! - `SHUTDOWN_GRACE_SECS` - Seconds to wait for the pool to drain on
//!   shutdown (default: 10)
//! - `DB_CONNECT_ATTEMPTS` - Connection attempts before giving up
//!   (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deployment environment mode.
///
/// Affects pool sizing and the default logging verbosity; the production
/// defaults apply whenever `APP_ENV` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    Test,
    #[default]
    Production,
}

impl Environment {
    /// Canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// Maximum pool size for this environment.
    #[must_use]
    pub const fn max_connections(self) -> u32 {
        match self {
            Self::Development => 5,
            Self::Test => 2,
            Self::Production => 10,
        }
    }

    /// Minimum idle connections kept in the pool.
    #[must_use]
    pub const fn min_connections(self) -> u32 {
        match self {
            Self::Development | Self::Test => 0,
            Self::Production => 2,
        }
    }

    /// Default `RUST_LOG`-style filter when none is configured.
    #[must_use]
    pub const fn default_log_filter(self) -> &'static str {
        match self {
            Self::Development => "roster_server=debug,tower_http=debug",
            Self::Test => "roster_server=warn",
            Self::Production => "roster_server=info,tower_http=info",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Optional separate URL for the isolated test database
    pub test_database_url: Option<SecretString>,
    /// Deployment environment mode
    pub environment: Environment,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Grace period for draining the pool on shutdown
    pub shutdown_grace: Duration,
    /// Initial connection attempts before giving up
    pub db_connect_attempts: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or any
    /// variable fails to parse. The process is expected to fail fast on
    /// this error.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ROSTER_DATABASE_URL")?;
        let test_database_url = get_optional_env("TEST_DATABASE_URL").map(SecretString::from);
        let environment = get_env_or_default("APP_ENV", "production")
            .parse::<Environment>()
            .map_err(|e| ConfigError::InvalidEnvVar("APP_ENV".to_string(), e))?;
        let host = get_env_or_default("ROSTER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ROSTER_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ROSTER_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ROSTER_PORT".to_string(), e.to_string()))?;
        let shutdown_grace_secs = get_env_or_default("SHUTDOWN_GRACE_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHUTDOWN_GRACE_SECS".to_string(), e.to_string())
            })?;
        let db_connect_attempts = get_env_or_default("DB_CONNECT_ATTEMPTS", "5")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("DB_CONNECT_ATTEMPTS".to_string(), e.to_string())
            })?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            test_database_url,
            environment,
            host,
            port,
            shutdown_grace: Duration::from_secs(shutdown_grace_secs),
            db_connect_attempts: db_connect_attempts.max(1),
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., ROSTER_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_environment_default_is_production() {
        assert_eq!(Environment::default(), Environment::Production);
    }

    #[test]
    fn test_environment_pool_sizing() {
        assert!(Environment::Production.max_connections() > Environment::Test.max_connections());
        assert_eq!(Environment::Production.min_connections(), 2);
        assert_eq!(Environment::Test.min_connections(), 0);
    }

    #[test]
    fn test_default_log_filters_name_the_crate() {
        for env in [
            Environment::Development,
            Environment::Test,
            Environment::Production,
        ] {
            assert!(env.default_log_filter().contains("roster_server"));
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            database_url: SecretString::from("postgres://localhost/roster"),
            test_database_url: None,
            environment: Environment::Development,
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            shutdown_grace: Duration::from_secs(10),
            db_connect_attempts: 5,
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
