//! # tomblr-service
//!
//! Business logic service layer for Tomblr. Each service orchestrates the
//! metadata store, the object store and the chunk staging area to implement
//! one application-level use case.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references to the store traits.

pub mod access;
pub mod account;
pub mod admin;
pub mod context;
pub mod file;
pub mod folder;
pub mod quota;
pub mod share;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use access::AccessCodeService;
pub use account::AccountService;
pub use admin::AdminService;
pub use context::RequestContext;
pub use file::FileService;
pub use folder::FolderService;
pub use quota::QuotaLedger;
pub use share::ShareService;
pub use upload::{BlobCommitter, ChunkAssembler, UploadService};
