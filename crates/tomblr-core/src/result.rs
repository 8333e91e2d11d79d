//! Convenience result type alias for Tomblr.

use crate::error::AppError;

/// A specialized `Result` type for Tomblr operations.
pub type AppResult<T> = Result<T, AppError>;
