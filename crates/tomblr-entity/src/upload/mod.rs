//! In-flight upload state: chunked uploads and presigned direct uploads.

pub mod direct;
pub mod id;
pub mod pending;

pub use direct::DirectUpload;
pub use id::UploadId;
pub use pending::{ChunkMeta, ChunkReceipt, PendingUpload};
