//! Public share links.

pub mod service;

pub use service::{ShareLink, ShareService};
