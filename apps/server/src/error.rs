//! Domain error types for the QA manager.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// JSON file storage operation failed
    #[error("File storage error: {0}")]
    FileStorage(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// A referenced record does not exist, or a dependent record blocks the change
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Backend wiring does not match the configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Bug in the server itself; never caused by storage
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ConstraintViolation,
    BackendUnavailable,
    InvalidInput,
    Configuration,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(_) | AppError::FileStorage(_) => ErrorKind::BackendUnavailable,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure came from the storage layer itself (I/O, connection).
    pub fn is_backend_failure(&self) -> bool {
        self.kind() == ErrorKind::BackendUnavailable
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::FileStorage(err_str) => {
                tracing::error!("File storage error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "An internal storage error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::ConstraintViolation(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "CONSTRAINT_VIOLATION",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::Configuration(err_str) => {
                tracing::error!("Configuration error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "The server storage configuration is invalid".to_string(),
                )
            }
            AppError::Internal(err_str) => {
                tracing::error!("Internal error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        crate::db::classify_db_error("run query", err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileStorage(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Internal(format!("CSV rendering error: {}", err))
    }
}
