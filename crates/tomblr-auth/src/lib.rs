//! # tomblr-auth
//!
//! Credential handling for Tomblr.
//!
//! ## Modules
//!
//! - `jwt`: access token creation and validation
//! - `password`: Argon2id PIN hashing and PIN format rules
//! - `token`: random share tokens and access codes

pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PinValidator};
