//! Admin-only reporting and user management.

pub mod service;

pub use service::{AdminService, SystemStats};
