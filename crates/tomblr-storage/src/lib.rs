//! # tomblr-storage
//!
//! Object store implementations for Tomblr (S3-compatible and in-memory),
//! storage key derivation, and the on-disk staging area that holds
//! chunks until an upload is finalized.

pub mod chunked;
pub mod keys;
pub mod providers;

pub use chunked::ChunkStaging;
pub use providers::MemoryObjectStore;
#[cfg(feature = "s3")]
pub use providers::S3ObjectStore;
