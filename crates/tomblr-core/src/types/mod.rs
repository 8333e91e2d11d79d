//! Core type definitions used across the Tomblr workspace.

pub mod id;

pub use id::*;
