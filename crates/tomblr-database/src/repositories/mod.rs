//! PostgreSQL implementations of the metadata store traits.

pub mod access_code;
pub mod file;
pub mod folder;
pub mod user;

pub use access_code::AccessCodeRepository;
pub use file::FileRepository;
pub use folder::FolderRepository;
pub use user::UserRepository;

use tomblr_core::error::AppError;

/// Classify a sqlx error and prefix it with what the repository was doing.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let mut err = AppError::from(e);
        err.message = format!("{context}: {}", err.message);
        err
    }
}
