//! Object store capability used by the upload and sharing services.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Metadata about a stored blob.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectMeta {
    /// Storage key of the blob.
    pub key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type recorded at upload time.
    pub content_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// A presigned PUT target for a direct client upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PresignedUpload {
    /// Time-limited URL the client PUTs the object to.
    pub url: String,
    /// Key the object will be stored under.
    pub key: String,
}

/// Durable blob storage addressed by opaque keys.
///
/// The store gives no transactional guarantee with the metadata store;
/// callers that create metadata after a `put` must delete the blob
/// themselves when the metadata write fails.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g. "s3", "memory").
    fn backend(&self) -> &str;

    /// Create the backing bucket if it does not exist. Idempotent.
    async fn ensure_bucket(&self) -> AppResult<()>;

    /// Store `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()>;

    /// Produce a time-limited download URL for `key`.
    async fn presigned_get(&self, key: &str, ttl: Duration) -> AppResult<String>;

    /// Produce a time-limited upload URL for `key`.
    async fn presigned_put(&self, key: &str, ttl: Duration) -> AppResult<PresignedUpload>;

    /// Delete the object at `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Describe the object at `key`, failing with `NotFound` if it is absent.
    async fn stat(&self, key: &str) -> AppResult<ObjectMeta>;
}
