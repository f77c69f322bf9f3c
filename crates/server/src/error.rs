//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::{ErrorKind, RepositoryError};
use crate::services::UserServiceError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// User service operation failed.
    #[error("Service error: {0}")]
    Service(#[from] UserServiceError),

    /// Database operation failed outside a service.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Stable machine-readable error body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Stable code for programmatic handling.
    code: &'static str,
    /// Human-readable message (internal details scrubbed).
    message: String,
    /// The offending field, when determinable.
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl AppError {
    /// Whether this error should be reported to Sentry.
    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                UserServiceError::InvalidInput(_) | UserServiceError::InvalidBatch(_) => {
                    StatusCode::BAD_REQUEST
                }
                UserServiceError::AlreadyExists => StatusCode::CONFLICT,
                UserServiceError::NotFound => StatusCode::NOT_FOUND,
                UserServiceError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
                UserServiceError::Repository(repo) => repository_status(repo),
            },
            Self::Database(repo) => repository_status(repo),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Service(err) => match err {
                UserServiceError::InvalidInput(validation) => ErrorBody {
                    code: "validation_failed",
                    message: validation.to_string(),
                    field: Some(validation.field().to_owned()),
                },
                UserServiceError::InvalidBatch(batch) => ErrorBody {
                    code: "validation_failed",
                    message: batch.to_string(),
                    field: Some(batch.source.field().to_owned()),
                },
                UserServiceError::AlreadyExists => ErrorBody {
                    code: "duplicate_key",
                    message: "a user with this email already exists".to_owned(),
                    field: Some("email".to_owned()),
                },
                UserServiceError::NotFound => ErrorBody {
                    code: "not_found",
                    message: "user not found".to_owned(),
                    field: None,
                },
                UserServiceError::OperationFailed(_) => internal_body(),
                UserServiceError::Repository(repo) => repository_body(repo),
            },
            Self::Database(repo) => repository_body(repo),
            Self::BadRequest(message) => ErrorBody {
                code: "bad_request",
                message: message.clone(),
                field: None,
            },
        }
    }
}

/// Map a repository error kind onto an HTTP status.
fn repository_status(err: &RepositoryError) -> StatusCode {
    match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::DuplicateKey => StatusCode::CONFLICT,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Connection | ErrorKind::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Operation | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-safe body for a repository error; internal details are not leaked.
fn repository_body(err: &RepositoryError) -> ErrorBody {
    match err.kind() {
        ErrorKind::NotFound => ErrorBody {
            code: "not_found",
            message: "user not found".to_owned(),
            field: None,
        },
        ErrorKind::DuplicateKey => ErrorBody {
            code: "duplicate_key",
            message: "a user with this email already exists".to_owned(),
            field: err.field().map(ToOwned::to_owned),
        },
        ErrorKind::Validation => ErrorBody {
            code: "validation_failed",
            message: "the database rejected the data".to_owned(),
            field: err.field().map(ToOwned::to_owned),
        },
        ErrorKind::Connection | ErrorKind::Timeout => ErrorBody {
            code: "unavailable",
            message: "service temporarily unavailable".to_owned(),
            field: None,
        },
        ErrorKind::Operation | ErrorKind::Unknown => internal_body(),
    }
}

fn internal_body() -> ErrorBody {
    ErrorBody {
        code: "internal",
        message: "internal server error".to_owned(),
        field: None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
