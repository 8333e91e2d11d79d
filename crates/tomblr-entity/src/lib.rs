//! # tomblr-entity
//!
//! Domain entity models for Tomblr. Every struct in this crate represents
//! a database table row or a domain value object. Database entities
//! additionally derive `sqlx::FromRow`.

pub mod access_code;
pub mod file;
pub mod folder;
pub mod upload;
pub mod user;
