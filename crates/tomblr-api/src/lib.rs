//! # tomblr-api
//!
//! HTTP API layer for Tomblr built on Axum.
//!
//! Provides the REST endpoints, middleware (CORS, request logging),
//! the bearer token extractor, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, Backends};
