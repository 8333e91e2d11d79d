//! File access, deletion, ordering and usage.

pub mod service;

pub use service::{FileDownload, FileService};
