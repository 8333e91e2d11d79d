//! In-memory object store for tests and local development.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::traits::object_store::{ObjectMeta, ObjectStore, PresignedUpload};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// Object store that keeps every blob in a hash map.
///
/// Failures can be injected per key or globally to exercise the
/// compensation paths of the services.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    failing_deletes: Arc<RwLock<HashSet<String>>>,
    fail_all_deletes: Arc<AtomicBool>,
    fail_puts: Arc<AtomicBool>,
    bucket_checks: Arc<AtomicUsize>,
}

impl MemoryObjectStore {
    /// Create an empty store for `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::default(),
            failing_deletes: Arc::default(),
            fail_all_deletes: Arc::default(),
            fail_puts: Arc::default(),
            bucket_checks: Arc::default(),
        }
    }

    /// Make every subsequent `put` fail with `StorageUnavailable`.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make deletes of `key` fail with `StorageUnavailable`.
    pub async fn fail_delete_of(&self, key: impl Into<String>) {
        self.failing_deletes.write().await.insert(key.into());
    }

    /// Make every subsequent `delete` fail.
    pub fn fail_all_deletes(&self, fail: bool) {
        self.fail_all_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether a blob exists under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Bytes stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).map(|o| o.data.clone())
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store holds no blobs.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// How many times `ensure_bucket` has been called.
    pub fn bucket_checks(&self) -> usize {
        self.bucket_checks.load(Ordering::SeqCst)
    }

    fn url(&self, key: &str, method: &str, ttl: Duration) -> String {
        let expires = Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64);
        format!(
            "memory://{}/{}?method={method}&expires={}",
            self.bucket,
            key,
            expires.timestamp()
        )
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("tomblr")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn ensure_bucket(&self) -> AppResult<()> {
        self.bucket_checks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::storage(format!("Injected put failure: {key}")));
        }
        debug!(key, bytes = data.len(), "Stored object in memory");
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn presigned_get(&self, key: &str, ttl: Duration) -> AppResult<String> {
        Ok(self.url(key, "GET", ttl))
    }

    async fn presigned_put(&self, key: &str, ttl: Duration) -> AppResult<PresignedUpload> {
        Ok(PresignedUpload {
            url: self.url(key, "PUT", ttl),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        if self.fail_all_deletes.load(Ordering::SeqCst)
            || self.failing_deletes.read().await.contains(key)
        {
            return Err(AppError::storage(format!("Injected delete failure: {key}")));
        }
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn stat(&self, key: &str) -> AppResult<ObjectMeta> {
        let objects = self.objects.read().await;
        let obj = objects
            .get(key)
            .ok_or_else(|| AppError::not_found("Object not found"))?;
        Ok(ObjectMeta {
            key: key.to_string(),
            size_bytes: obj.data.len() as u64,
            content_type: Some(obj.content_type.clone()),
            last_modified: Some(obj.last_modified),
        })
    }
}
