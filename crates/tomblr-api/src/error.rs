//! Maps domain `AppError` to HTTP responses.

use std::error::Error as _;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use tomblr_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// An `AppError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Shorthand for a 400 with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::validation(message))
    }

    /// Shorthand for a 401 with `message`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::unauthorized(message))
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::QuotaExceeded => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::InconsistentUploadMetadata | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::IncompleteUpload | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::StorageUnavailable | ErrorKind::PersistenceUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::ChunkWriteFailed
        | ErrorKind::PartialDeleteFailure
        | ErrorKind::Configuration
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing message for a server-side failure. Internal detail such as
/// storage endpoints or database text stays in the log.
fn public_message(kind: ErrorKind, message: String) -> String {
    match kind {
        ErrorKind::StorageUnavailable => "Storage is temporarily unavailable".into(),
        ErrorKind::PersistenceUnavailable => "Metadata store is temporarily unavailable".into(),
        ErrorKind::ChunkWriteFailed => "Failed to store upload chunk".into(),
        // Composed by the service from counts only.
        ErrorKind::PartialDeleteFailure => message,
        _ => "Internal server error".into(),
    }
}

fn source_chain(err: &AppError) -> String {
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain.join(": ")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        if status.is_server_error() {
            tracing::error!(
                kind = %err.kind,
                error = %err.message,
                source = %source_chain(&err),
                details = ?err.details,
                "Request failed"
            );
        } else {
            tracing::debug!(kind = %err.kind, error = %err.message, "Request rejected");
        }

        let message = if status.is_server_error() {
            public_message(err.kind, err.message)
        } else {
            err.message
        };
        let body = ApiErrorResponse {
            error: err.kind.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
