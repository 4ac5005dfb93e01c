//! Error types for civic-positions
//!
//! Row-scoped problems are `ValidationError` data, not errors. The types here
//! cover what aborts a whole import run and what the HTTP surface reports.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure that ends an import run before or outside the row loop
#[derive(Debug, Error)]
pub enum ImportError {
    /// File could not be read as rows (bad encoding, missing header, empty)
    #[error("Malformed file: {0}")]
    MalformedFile(String),

    /// Store failure outside any single row (log creation, finalization)
    #[error(transparent)]
    Store(#[from] civic_common::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. a term that already ended
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Retryable store contention (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// civic-common error
    #[error("Common error: {0}")]
    Common(#[from] civic_common::Error),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MalformedFile(msg) => ApiError::BadRequest(msg),
            ImportError::Store(e) => ApiError::Common(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use civic_common::Error as Common;

        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) | ApiError::Common(Common::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg)
            }
            ApiError::BadRequest(msg) | ApiError::Common(Common::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Conflict(msg) | ApiError::Common(Common::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg)
            }
            ApiError::Unavailable(msg) | ApiError::Common(Common::Transient(msg)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(ref err) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
