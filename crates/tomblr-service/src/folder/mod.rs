//! Folder hierarchy management.

pub mod service;
pub mod tree;

pub use service::{FolderDeletion, FolderService};
pub use tree::FolderArena;
