//! PIN hashing and format rules.

pub mod hasher;
pub mod validator;

pub use hasher::PasswordHasher;
pub use validator::PinValidator;
