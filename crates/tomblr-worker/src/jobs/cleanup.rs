//! Abandoned upload cleanup.

use chrono::Duration;
use tracing;

use tomblr_core::result::AppResult;
use tomblr_service::{ChunkAssembler, UploadService};

/// Discards staged uploads that have seen no chunk for longer than the
/// retention window, and blobs of direct uploads whose URL expired that
/// long ago without being completed.
#[derive(Debug, Clone)]
pub struct UploadCleanupJob {
    /// Assembler owning the staging area
    assembler: ChunkAssembler,
    /// Issuer of presigned direct uploads
    uploads: UploadService,
    /// Idle time after which an upload is abandoned
    retention: Duration,
}

impl UploadCleanupJob {
    /// Create a cleanup job using the assembler's configured retention
    pub fn new(assembler: ChunkAssembler, uploads: UploadService) -> Self {
        let retention = assembler.retention();
        Self {
            assembler,
            uploads,
            retention,
        }
    }

    /// Override the retention window
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Run one sweep. Returns the number of uploads discarded.
    pub async fn run(&self) -> AppResult<usize> {
        tracing::info!(
            retention_hours = self.retention.num_hours(),
            "Running abandoned upload cleanup"
        );
        let chunked = self.assembler.purge_abandoned(self.retention).await?;
        let direct = self.uploads.purge_expired_direct(self.retention).await?;
        tracing::info!(chunked, direct, "Abandoned upload cleanup finished");
        Ok(chunked + direct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use chrono::Utc;
    use tomblr_core::config::UploadConfig;
    use tomblr_database::MemoryStore;
    use bytes::Bytes;
    use tomblr_core::traits::ObjectStore;
    use tomblr_core::types::UserId;
    use tomblr_entity::upload::{ChunkMeta, DirectUpload, PendingUpload, UploadId};
    use tomblr_service::{BlobCommitter, QuotaLedger};
    use tomblr_storage::{ChunkStaging, MemoryObjectStore};

    async fn staged(staging: &ChunkStaging, id: &str, idle: Duration) {
        let upload_id = UploadId::parse(id).unwrap();
        let mut pending = PendingUpload::new(
            upload_id.clone(),
            tomblr_core::types::UserId::new(),
            ChunkMeta {
                file_name: format!("{id}.bin"),
                mime_type: "application/octet-stream".into(),
                declared_size: 8,
                total_chunks: 2,
                folder_id: None,
            },
        );
        staging.write_chunk(&upload_id, 0, b"abcd").await.unwrap();
        pending.record_chunk(0, 4);
        pending.last_activity = Utc::now() - idle;
        staging.save_manifest(&pending).await.unwrap();
    }

    fn job(staging: ChunkStaging, objects: Arc<MemoryObjectStore>) -> UploadCleanupJob {
        let metadata = Arc::new(MemoryStore::new());
        let quota = QuotaLedger::new(metadata.clone());
        let committer = BlobCommitter::new(metadata.clone(), objects.clone(), quota.clone());
        let config = UploadConfig::default();
        let assembler = ChunkAssembler::new(
            staging.clone(),
            committer.clone(),
            metadata.clone(),
            config.clone(),
        );
        let uploads = UploadService::new(committer, metadata, objects, staging, quota, config);
        UploadCleanupJob::new(assembler, uploads)
    }

    fn cleanup(staging: &ChunkStaging) -> UploadCleanupJob {
        job(staging.clone(), Arc::new(MemoryObjectStore::default()))
    }

    #[tokio::test]
    async fn test_sweep_uses_configured_retention() {
        let dir = tempfile::tempdir().unwrap();
        let staging = ChunkStaging::new(dir.path());
        staged(&staging, "old", Duration::hours(30)).await;
        staged(&staging, "recent", Duration::hours(1)).await;

        let job = cleanup(&staging);
        assert_eq!(job.run().await.unwrap(), 1);

        let left = staging.list_manifests().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].upload_id.as_str(), "recent");
    }

    #[tokio::test]
    async fn test_retention_override() {
        let dir = tempfile::tempdir().unwrap();
        let staging = ChunkStaging::new(dir.path());
        staged(&staging, "recent", Duration::hours(1)).await;

        let job = cleanup(&staging)
            .with_retention(Duration::minutes(30));
        assert_eq!(job.run().await.unwrap(), 1);
        assert!(staging.list_manifests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_staging_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let job = cleanup(&ChunkStaging::new(dir.path().join("missing")));
        assert_eq!(job.run().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_deletes_expired_direct_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let staging = ChunkStaging::new(dir.path());
        let objects = Arc::new(MemoryObjectStore::default());
        let user_id = UserId::new();

        let tickets = [("gone.bin", Duration::hours(30)), ("kept.bin", Duration::hours(-1))];
        for (name, expired_for) in tickets {
            let key = format!("{user_id}/0193-{name}");
            objects
                .put(&key, Bytes::from_static(b"blob"), "application/octet-stream")
                .await
                .unwrap();
            staging
                .save_direct(&DirectUpload {
                    storage_key: key,
                    user_id,
                    file_name: name.into(),
                    folder_id: None,
                    issued_at: Utc::now() - expired_for,
                    expires_at: Utc::now() - expired_for,
                })
                .await
                .unwrap();
        }

        let sweeper = job(staging.clone(), objects.clone());
        assert_eq!(sweeper.run().await.unwrap(), 1);
        assert!(!objects.contains(&format!("{user_id}/0193-gone.bin")).await);
        assert!(objects.contains(&format!("{user_id}/0193-kept.bin")).await);
        assert_eq!(staging.list_direct().await.unwrap().len(), 1);
    }
}
