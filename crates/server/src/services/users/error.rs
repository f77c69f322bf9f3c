//! User service error types.

use thiserror::Error;

use roster_core::{BatchValidationError, ValidationError};

use crate::db::RepositoryError;

/// Errors that can occur during user service operations.
///
/// The service introduces no failure categories beyond the repository
/// taxonomy; these variants re-express taxonomy kinds at the service
/// boundary so callers can match without digging into repository errors.
#[derive(Debug, Error)]
pub enum UserServiceError {
    /// Input failed validation (raised before any storage access).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A record in a batch failed validation; the whole batch is rejected.
    #[error("invalid batch input: {0}")]
    InvalidBatch(#[from] BatchValidationError),

    /// A user with this email already exists.
    #[error("a user with this email already exists")]
    AlreadyExists,

    /// User not found.
    #[error("user not found")]
    NotFound,

    /// The operation completed without affecting any row.
    #[error("{0} affected no rows")]
    OperationFailed(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
