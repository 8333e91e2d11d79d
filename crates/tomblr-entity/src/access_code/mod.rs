//! Invitation codes gating registration.

pub mod model;

pub use model::{AccessCode, CreateAccessCode};
