//! Response DTOs.

use serde::{Deserialize, Serialize};

use tomblr_core::types::FileId;
use tomblr_entity::file::File;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Result of a finalized chunked upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    /// The new file's id.
    pub file_id: FileId,
    /// The new file.
    pub file: File,
}

/// Access code check outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    /// Always true; failures are errors.
    pub valid: bool,
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count value.
    pub count: usize,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
}
