//! Unified application error types for Tomblr.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The entity is absent or not owned by the caller.
    NotFound,
    /// Committing the upload would push the user past their storage limit.
    QuotaExceeded,
    /// A chunk disagreed with the metadata recorded for its upload.
    InconsistentUploadMetadata,
    /// Finalize was requested before every chunk arrived.
    IncompleteUpload,
    /// A chunk could not be persisted to the staging area.
    ChunkWriteFailed,
    /// A bulk delete removed the metadata but some blobs could not be deleted.
    PartialDeleteFailure,
    /// The object store is unreachable or rejected the request.
    StorageUnavailable,
    /// The metadata store is unreachable or rejected the request.
    PersistenceUnavailable,
    /// Input validation failed.
    Validation,
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller is authenticated but lacks the required role.
    Forbidden,
    /// A conflict occurred (duplicate entry, concurrent modification, etc.).
    Conflict,
    /// A configuration error occurred.
    Configuration,
    /// An internal server error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::QuotaExceeded => write!(f, "QUOTA_EXCEEDED"),
            Self::InconsistentUploadMetadata => write!(f, "INCONSISTENT_UPLOAD_METADATA"),
            Self::IncompleteUpload => write!(f, "INCOMPLETE_UPLOAD"),
            Self::ChunkWriteFailed => write!(f, "CHUNK_WRITE_FAILED"),
            Self::PartialDeleteFailure => write!(f, "PARTIAL_DELETE_FAILURE"),
            Self::StorageUnavailable => write!(f, "STORAGE_UNAVAILABLE"),
            Self::PersistenceUnavailable => write!(f, "PERSISTENCE_UNAVAILABLE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Tomblr.
///
/// `details` carries the items an aggregate operation failed on, such as
/// the storage keys a folder delete could not remove. It is meant for
/// callers and logs, and is never rendered into an HTTP response body.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Items the operation failed on.
    pub details: Vec<String>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
            source: Some(Box::new(source)),
        }
    }

    /// Attach the list of failed items.
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a quota-exceeded error.
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::QuotaExceeded, message)
    }

    /// Create an inconsistent-upload-metadata error.
    pub fn inconsistent_upload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InconsistentUploadMetadata, message)
    }

    /// Create an incomplete-upload error.
    pub fn incomplete_upload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IncompleteUpload, message)
    }

    /// Create a chunk-write-failed error.
    pub fn chunk_write_failed(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(ErrorKind::ChunkWriteFailed, message, source)
    }

    /// Create a partial-delete-failure error listing the keys left behind.
    pub fn partial_delete(message: impl Into<String>, failed_keys: Vec<String>) -> Self {
        Self::new(ErrorKind::PartialDeleteFailure, message).with_details(failed_keys)
    }

    /// Create a storage-unavailable error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageUnavailable, message)
    }

    /// Create a persistence-unavailable error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PersistenceUnavailable, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error should be reported as a server-side failure.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ChunkWriteFailed
                | ErrorKind::PartialDeleteFailure
                | ErrorKind::StorageUnavailable
                | ErrorKind::PersistenceUnavailable
                | ErrorKind::Configuration
                | ErrorKind::Internal
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            details: self.details.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::with_source(ErrorKind::NotFound, "Resource not found", err);
        }
        Self::with_source(
            ErrorKind::StorageUnavailable,
            format!("I/O error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::with_source(ErrorKind::NotFound, "Row not found", err),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::with_source(ErrorKind::Conflict, "Duplicate entry", err)
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::with_source(ErrorKind::NotFound, "Referenced row not found", err)
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::with_source(
                ErrorKind::PersistenceUnavailable,
                "Metadata store unavailable",
                err,
            ),
            _ => Self::with_source(ErrorKind::Internal, format!("Database error: {err}"), err),
        }
    }
}
