//! Repository error taxonomy.
//!
//! All storage failures are normalized into a closed set of [`ErrorKind`]s
//! at the repository boundary, so callers can match on a stable category
//! (for example to distinguish "already exists" from "invalid input" from
//! "transient, retry later") without knowing Postgres SQLSTATE codes.

use core::fmt;

/// Stable, programmatically matchable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested row does not exist.
    NotFound,
    /// A uniqueness constraint was violated (e.g., duplicate email).
    DuplicateKey,
    /// The database rejected the data (foreign key, not-null, check).
    Validation,
    /// The connection to the database failed or was lost.
    Connection,
    /// The operation was cancelled or timed out.
    Timeout,
    /// The database reported a recognized error outside the above.
    Operation,
    /// Anything the classifier does not recognize.
    Unknown,
}

impl ErrorKind {
    /// Canonical snake_case code for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DuplicateKey => "duplicate_key",
            Self::Validation => "validation_failed",
            Self::Connection => "connection_error",
            Self::Timeout => "timeout",
            Self::Operation => "operation_failed",
            Self::Unknown => "unknown",
        }
    }

    /// Classify a Postgres SQLSTATE code.
    ///
    /// - `23505` (unique violation) -> [`Self::DuplicateKey`]
    /// - `23502`/`23503`/`23514` (not-null/fk/check) -> [`Self::Validation`]
    /// - class `08` (connection exception) -> [`Self::Connection`]
    /// - `57014`/`57P01`/`57P02`/`57P03` (cancel/shutdown) -> [`Self::Timeout`]
    /// - any other code -> [`Self::Operation`]
    #[must_use]
    pub fn from_sqlstate(code: &str) -> Self {
        match code {
            "23505" => Self::DuplicateKey,
            "23502" | "23503" | "23514" => Self::Validation,
            "57014" | "57P01" | "57P02" | "57P03" => Self::Timeout,
            _ if code.starts_with("08") => Self::Connection,
            _ => Self::Operation,
        }
    }

    /// Whether retrying the operation later could reasonably succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Connection | Self::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced by the repository layer.
///
/// Carries the [`ErrorKind`], a human-readable message, and structured
/// metadata: the repository `operation` that failed, the `entity` it was
/// operating on, and the offending `field` where determinable (currently
/// only for unique violations). The original `sqlx::Error`, when there is
/// one, is preserved as the source.
#[derive(Debug)]
pub struct RepositoryError {
    kind: ErrorKind,
    message: String,
    operation: Option<&'static str>,
    entity: Option<&'static str>,
    field: Option<String>,
    source: Option<sqlx::Error>,
}

impl RepositoryError {
    /// Create an error with the given kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: None,
            entity: None,
            field: None,
            source: None,
        }
    }

    /// Convenience constructor for [`ErrorKind::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Convenience constructor for [`ErrorKind::DuplicateKey`].
    #[must_use]
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateKey, message)
    }

    /// Convenience constructor for [`ErrorKind::Connection`].
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Convenience constructor for [`ErrorKind::Operation`].
    #[must_use]
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Operation, message)
    }

    /// Classify a raw sqlx failure into the taxonomy.
    ///
    /// Database-reported errors are classified by SQLSTATE; client-side
    /// failures map as follows: `RowNotFound` -> `NotFound`,
    /// `PoolTimedOut` -> `Timeout`, I/O and TLS and closed-pool failures ->
    /// `Connection`, everything else -> `Unknown`.
    #[must_use]
    pub fn from_sqlx(operation: &'static str, error: sqlx::Error) -> Self {
        let (kind, message, field) = match &error {
            sqlx::Error::Database(db_err) => {
                let kind = db_err
                    .code()
                    .map_or(ErrorKind::Unknown, |code| ErrorKind::from_sqlstate(&code));
                let field = if kind == ErrorKind::DuplicateKey {
                    db_err.constraint().and_then(field_from_constraint)
                } else {
                    None
                };
                (kind, db_err.message().to_owned(), field)
            }
            sqlx::Error::RowNotFound => (ErrorKind::NotFound, "row not found".to_owned(), None),
            sqlx::Error::PoolTimedOut => (
                ErrorKind::Timeout,
                "timed out waiting for a pooled connection".to_owned(),
                None,
            ),
            sqlx::Error::PoolClosed => (
                ErrorKind::Connection,
                "connection pool is closed".to_owned(),
                None,
            ),
            sqlx::Error::Io(io_err) => (ErrorKind::Connection, io_err.to_string(), None),
            sqlx::Error::Tls(tls_err) => (ErrorKind::Connection, tls_err.to_string(), None),
            sqlx::Error::Protocol(message) => (ErrorKind::Connection, message.clone(), None),
            other => (ErrorKind::Unknown, other.to_string(), None),
        };

        Self {
            kind,
            message,
            operation: Some(operation),
            entity: None,
            field,
            source: Some(error),
        }
    }

    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The repository operation that failed, when recorded.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        self.operation
    }

    /// The entity the operation targeted, when recorded.
    #[must_use]
    pub const fn entity(&self) -> Option<&'static str> {
        self.entity
    }

    /// The offending field, when determinable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Record the failing operation; a no-op if one is already recorded.
    ///
    /// Re-wrapping is idempotent: metadata merges, the first writer wins.
    #[must_use]
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation.get_or_insert(operation);
        self
    }

    /// Record the target entity; a no-op if one is already recorded.
    #[must_use]
    pub fn with_entity(mut self, entity: &'static str) -> Self {
        self.entity.get_or_insert(entity);
        self
    }

    /// Record the offending field; a no-op if one is already recorded.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field.get_or_insert_with(|| field.into());
        self
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.entity, self.operation) {
            (Some(entity), Some(operation)) => {
                write!(f, "{entity} {operation}: {}: {}", self.kind, self.message)
            }
            (None, Some(operation)) => {
                write!(f, "{operation}: {}: {}", self.kind, self.message)
            }
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// Derive the offending column from a constraint name.
///
/// Postgres names default constraints `<table>_<column>_<suffix>`, e.g.
/// `users_email_key` for the unique index on `users.email`.
fn field_from_constraint(constraint: &str) -> Option<String> {
    let rest = constraint.strip_prefix("users_")?;
    let column = rest
        .strip_suffix("_key")
        .or_else(|| rest.strip_suffix("_idx"))
        .or_else(|| rest.strip_suffix("_fkey"))
        .or_else(|| rest.strip_suffix("_check"))?;
    (!column.is_empty()).then(|| column.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlstate_unique_violation() {
        assert_eq!(ErrorKind::from_sqlstate("23505"), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_sqlstate_integrity_family() {
        assert_eq!(ErrorKind::from_sqlstate("23502"), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_sqlstate("23503"), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_sqlstate("23514"), ErrorKind::Validation);
    }

    #[test]
    fn test_sqlstate_connection_class() {
        for code in ["08000", "08003", "08006", "08001", "08004", "08P01"] {
            assert_eq!(ErrorKind::from_sqlstate(code), ErrorKind::Connection);
        }
    }

    #[test]
    fn test_sqlstate_timeout_family() {
        for code in ["57014", "57P01", "57P02", "57P03"] {
            assert_eq!(ErrorKind::from_sqlstate(code), ErrorKind::Timeout);
        }
    }

    #[test]
    fn test_sqlstate_other_codes_are_operation() {
        assert_eq!(ErrorKind::from_sqlstate("42P01"), ErrorKind::Operation);
        assert_eq!(ErrorKind::from_sqlstate("22001"), ErrorKind::Operation);
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::Connection.is_transient());
        assert!(ErrorKind::Timeout.is_transient());
        assert!(!ErrorKind::DuplicateKey.is_transient());
        assert!(!ErrorKind::NotFound.is_transient());
    }

    #[test]
    fn test_field_from_constraint() {
        assert_eq!(
            field_from_constraint("users_email_key").as_deref(),
            Some("email")
        );
        assert_eq!(
            field_from_constraint("users_email_idx").as_deref(),
            Some("email")
        );
        assert_eq!(field_from_constraint("other_table_pk"), None);
        assert_eq!(field_from_constraint("users__key"), None);
    }

    #[test]
    fn test_metadata_merge_is_idempotent() {
        let err = RepositoryError::duplicate_key("email already exists")
            .with_operation("create")
            .with_entity("user")
            .with_field("email")
            // A second wrap at an outer boundary must not overwrite
            .with_operation("create_user")
            .with_field("name");

        assert_eq!(err.operation(), Some("create"));
        assert_eq!(err.entity(), Some("user"));
        assert_eq!(err.field(), Some("email"));
    }

    #[test]
    fn test_display_includes_metadata() {
        let err = RepositoryError::not_found("user 7 does not exist")
            .with_operation("update")
            .with_entity("user");
        let rendered = err.to_string();
        assert!(rendered.contains("user update"));
        assert!(rendered.contains("not_found"));
        assert!(rendered.contains("user 7 does not exist"));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let err = RepositoryError::from_sqlx("find_by_id", sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.operation(), Some("find_by_id"));
    }

    #[test]
    fn test_from_sqlx_pool_timed_out() {
        let err = RepositoryError::from_sqlx("create", sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.kind().is_transient());
    }

    #[test]
    fn test_from_sqlx_pool_closed() {
        let err = RepositoryError::from_sqlx("count", sqlx::Error::PoolClosed);
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
}
