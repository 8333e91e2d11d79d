//! Core traits defined in `tomblr-core` and implemented by other crates.

pub mod object_store;

pub use object_store::{ObjectMeta, ObjectStore, PresignedUpload};
