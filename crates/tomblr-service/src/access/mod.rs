//! Invitation codes that gate registration.

pub mod service;

pub use service::AccessCodeService;
