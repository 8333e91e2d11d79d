//! # tomblr-core
//!
//! Core crate for Tomblr. Contains the configuration schema, typed
//! identifiers, the object store capability trait, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Tomblr crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
