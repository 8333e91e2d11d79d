//! Upload protocol configuration.

use serde::{Deserialize, Serialize};

/// Limits and timings for single-shot and chunked uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Chunk size clients are told to use.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,
    /// Files larger than this should be chunked.
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold_bytes: u64,
    /// Largest single chunk accepted.
    #[serde(default = "default_max_chunk")]
    pub max_chunk_bytes: u64,
    /// Upper bound on `totalChunks` for one upload.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: u32,
    /// Idle time after which a pending upload is considered abandoned.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    /// Lifetime of presigned download URLs.
    #[serde(default = "default_download_ttl")]
    pub download_url_ttl_seconds: u64,
    /// Lifetime of presigned direct-upload URLs.
    #[serde(default = "default_upload_ttl")]
    pub upload_url_ttl_seconds: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
            chunk_threshold_bytes: default_chunk_threshold(),
            max_chunk_bytes: default_max_chunk(),
            max_chunks: default_max_chunks(),
            retention_hours: default_retention_hours(),
            download_url_ttl_seconds: default_download_ttl(),
            upload_url_ttl_seconds: default_upload_ttl(),
        }
    }
}

fn default_chunk_size() -> u64 {
    5 * 1024 * 1024
}

fn default_chunk_threshold() -> u64 {
    10 * 1024 * 1024
}

fn default_max_chunk() -> u64 {
    8 * 1024 * 1024
}

fn default_max_chunks() -> u32 {
    10_000
}

fn default_retention_hours() -> u64 {
    24
}

fn default_download_ttl() -> u64 {
    3600
}

fn default_upload_ttl() -> u64 {
    900
}
