//! Upload flows: single-request uploads, chunked uploads and presigned
//! direct uploads.

pub mod assembler;
pub mod commit;
pub mod service;

pub use assembler::{ChunkAssembler, ChunkInput};
pub use commit::{BlobCommitter, NewBlob};
pub use service::{DirectUploadRequest, SimpleUpload, UploadService};
