//! # tomblr-database
//!
//! Metadata store for Tomblr. The [`store`] traits describe what the
//! services need; [`repositories`] implements them on PostgreSQL and
//! [`memory`] implements them in process for tests and local tooling.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{AccessCodeStore, FileStore, FolderStore, RemovedSubtree, UserStore};
