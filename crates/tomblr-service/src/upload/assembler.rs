//! Chunk assembler: accepts chunks of a resumable upload and turns a
//! complete set into a single committed file.
//!
//! Chunks for one upload may arrive concurrently and in any order. Manifest
//! read-modify-write cycles for one upload id are serialized by a per-upload
//! async mutex; finalize is additionally gated by an atomic claim so that at
//! most one finalize per upload id ever runs.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tomblr_core::config::UploadConfig;
use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::types::FolderId;
use tomblr_database::store::FolderStore;
use tomblr_entity::file::File;
use tomblr_entity::upload::{ChunkMeta, ChunkReceipt, PendingUpload, UploadId};
use tomblr_storage::ChunkStaging;

use super::commit::{BlobCommitter, NewBlob};
use crate::context::RequestContext;

/// One chunk as received from a client.
#[derive(Debug, Clone)]
pub struct ChunkInput {
    /// Upload the chunk belongs to.
    pub upload_id: UploadId,
    /// Zero-based position of the chunk.
    pub chunk_index: u32,
    /// Number of chunks the client will send.
    pub total_chunks: u32,
    /// Final file name.
    pub file_name: String,
    /// Final MIME type.
    pub mime_type: String,
    /// Total size the client announced.
    pub declared_size: u64,
    /// Destination folder.
    pub folder_id: Option<FolderId>,
    /// Chunk bytes.
    pub data: Bytes,
}

/// Releases a finalize claim when dropped.
struct ClaimGuard<'a> {
    claims: &'a DashMap<UploadId, ()>,
    upload_id: UploadId,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.claims.remove(&self.upload_id);
    }
}

/// Stages chunks and commits complete uploads.
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    staging: ChunkStaging,
    committer: BlobCommitter,
    folders: Arc<dyn FolderStore>,
    config: UploadConfig,
    locks: Arc<DashMap<UploadId, Arc<Mutex<()>>>>,
    finalizing: Arc<DashMap<UploadId, ()>>,
}

impl ChunkAssembler {
    /// Creates a new assembler.
    pub fn new(
        staging: ChunkStaging,
        committer: BlobCommitter,
        folders: Arc<dyn FolderStore>,
        config: UploadConfig,
    ) -> Self {
        Self {
            staging,
            committer,
            folders,
            config,
            locks: Arc::new(DashMap::new()),
            finalizing: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, upload_id: &UploadId) -> Arc<Mutex<()>> {
        self.locks
            .entry(upload_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry once nobody else holds or waits on it.
    fn release_lock(&self, upload_id: &UploadId, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks
            .remove_if(upload_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn validate(&self, input: &ChunkInput) -> AppResult<()> {
        if input.file_name.trim().is_empty() {
            return Err(AppError::validation("fileName is required"));
        }
        if input.total_chunks == 0 || input.total_chunks > self.config.max_chunks {
            return Err(AppError::validation(format!(
                "totalChunks must be between 1 and {}",
                self.config.max_chunks
            )));
        }
        if input.chunk_index >= input.total_chunks {
            return Err(AppError::validation(format!(
                "chunkIndex {} is outside 0..{}",
                input.chunk_index, input.total_chunks
            )));
        }
        if input.data.len() as u64 > self.config.max_chunk_bytes {
            return Err(AppError::validation(format!(
                "Chunk exceeds the maximum of {} bytes",
                self.config.max_chunk_bytes
            )));
        }
        Ok(())
    }

    /// Accept one chunk, creating the upload on its first chunk.
    pub async fn begin_or_continue(
        &self,
        ctx: &RequestContext,
        input: ChunkInput,
    ) -> AppResult<ChunkReceipt> {
        self.validate(&input)?;

        let lock = self.lock_for(&input.upload_id);
        let result = {
            let _guard = lock.lock().await;
            self.accept_locked(ctx, input.clone()).await
        };
        self.release_lock(&input.upload_id, lock);
        result
    }

    async fn accept_locked(&self, ctx: &RequestContext, input: ChunkInput) -> AppResult<ChunkReceipt> {
        if self.finalizing.contains_key(&input.upload_id) {
            return Err(AppError::conflict("Upload is being finalized"));
        }

        let meta = ChunkMeta {
            file_name: input.file_name,
            mime_type: input.mime_type,
            declared_size: input.declared_size,
            total_chunks: input.total_chunks,
            folder_id: input.folder_id,
        };

        let mut pending = match self.staging.load_manifest(&input.upload_id).await? {
            Some(existing) => {
                check_consistent(&existing, ctx, &meta)?;
                existing
            }
            None => {
                if let Some(folder_id) = meta.folder_id {
                    self.folders
                        .find_owned(folder_id, ctx.user_id)
                        .await?
                        .ok_or_else(|| AppError::not_found("Folder not found"))?;
                }
                debug!(
                    upload_id = %input.upload_id,
                    user_id = %ctx.user_id,
                    total_chunks = meta.total_chunks,
                    declared_size = meta.declared_size,
                    "Starting chunked upload"
                );
                PendingUpload::new(input.upload_id.clone(), ctx.user_id, meta)
            }
        };

        let len = self
            .staging
            .write_chunk(&input.upload_id, input.chunk_index, &input.data)
            .await?;
        pending.record_chunk(input.chunk_index, len);
        self.staging.save_manifest(&pending).await?;

        Ok(ChunkReceipt {
            upload_id: input.upload_id,
            chunk_index: input.chunk_index,
            chunks_received: pending.chunks.len() as u32,
            total_chunks: pending.meta.total_chunks,
            bytes_received: pending.bytes_received(),
            complete: pending.is_complete(),
        })
    }

    /// Assemble a complete upload into a file. At most one call per upload
    /// id succeeds; a concurrent second call fails with `Conflict`.
    pub async fn finalize(&self, ctx: &RequestContext, upload_id: &UploadId) -> AppResult<File> {
        let _claim = match self.finalizing.entry(upload_id.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::conflict("Upload is already being finalized"));
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                ClaimGuard {
                    claims: &self.finalizing,
                    upload_id: upload_id.clone(),
                }
            }
        };

        let lock = self.lock_for(upload_id);
        let result = {
            let _guard = lock.lock().await;
            self.finalize_locked(ctx, upload_id).await
        };
        self.release_lock(upload_id, lock);
        result
    }

    async fn finalize_locked(&self, ctx: &RequestContext, upload_id: &UploadId) -> AppResult<File> {
        let pending = self
            .staging
            .load_manifest(upload_id)
            .await?
            .filter(|p| p.user_id == ctx.user_id)
            .ok_or_else(|| AppError::not_found("Upload not found"))?;

        let missing = pending.missing_chunks();
        if !missing.is_empty() {
            return Err(AppError::incomplete_upload(format!(
                "Upload {upload_id} is missing {} of {} chunks (first missing: {})",
                missing.len(),
                pending.meta.total_chunks,
                missing[0]
            )));
        }

        let data = self
            .staging
            .concat(upload_id, pending.meta.total_chunks)
            .await?;
        if data.len() as u64 != pending.meta.declared_size {
            return Err(AppError::inconsistent_upload(format!(
                "Assembled {} bytes but {} were declared",
                data.len(),
                pending.meta.declared_size
            )));
        }

        let file = self
            .committer
            .commit(
                ctx.user_id,
                NewBlob {
                    name: pending.meta.file_name.clone(),
                    mime_type: pending.meta.mime_type.clone(),
                    folder_id: pending.meta.folder_id,
                    data,
                },
            )
            .await?;

        if let Err(e) = self.staging.discard(upload_id).await {
            warn!(upload_id = %upload_id, error = %e, "Failed to discard staged chunks");
        }

        info!(
            upload_id = %upload_id,
            user_id = %ctx.user_id,
            file_id = %file.id,
            chunks = pending.meta.total_chunks,
            "Chunked upload finalized"
        );
        Ok(file)
    }

    /// Discard uploads with no activity for longer than `retention`.
    /// Returns how many were removed.
    pub async fn purge_abandoned(&self, retention: Duration) -> AppResult<usize> {
        let cutoff = Utc::now() - retention;
        let mut purged = 0;

        for pending in self.staging.list_manifests().await? {
            if pending.last_activity >= cutoff || self.finalizing.contains_key(&pending.upload_id) {
                continue;
            }

            let lock = self.lock_for(&pending.upload_id);
            let removed = {
                let _guard = lock.lock().await;
                self.purge_locked(&pending.upload_id, cutoff).await
            };
            self.release_lock(&pending.upload_id, lock);

            match removed {
                Ok(true) => purged += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(upload_id = %pending.upload_id, error = %e, "Failed to purge abandoned upload");
                }
            }
        }

        if purged > 0 {
            info!(purged, "Purged abandoned uploads");
        }
        Ok(purged)
    }

    async fn purge_locked(
        &self,
        upload_id: &UploadId,
        cutoff: chrono::DateTime<Utc>,
    ) -> AppResult<bool> {
        // A chunk may have arrived between listing and locking.
        let still_stale = self
            .staging
            .load_manifest(upload_id)
            .await?
            .is_some_and(|p| p.last_activity < cutoff);
        if !still_stale || self.finalizing.contains_key(upload_id) {
            return Ok(false);
        }
        self.staging.discard(upload_id).await?;
        debug!(upload_id = %upload_id, "Discarded abandoned upload");
        Ok(true)
    }

    /// Retention window from configuration.
    pub fn retention(&self) -> Duration {
        Duration::hours(self.config.retention_hours as i64)
    }
}

fn check_consistent(existing: &PendingUpload, ctx: &RequestContext, meta: &ChunkMeta) -> AppResult<()> {
    if existing.user_id != ctx.user_id {
        return Err(AppError::inconsistent_upload(
            "Upload belongs to a different user",
        ));
    }
    let recorded = &existing.meta;
    if recorded.declared_size != meta.declared_size {
        return Err(AppError::inconsistent_upload(format!(
            "fileSize {} does not match {} from earlier chunks",
            meta.declared_size, recorded.declared_size
        )));
    }
    if recorded.total_chunks != meta.total_chunks {
        return Err(AppError::inconsistent_upload(format!(
            "totalChunks {} does not match {} from earlier chunks",
            meta.total_chunks, recorded.total_chunks
        )));
    }
    if recorded.folder_id != meta.folder_id {
        return Err(AppError::inconsistent_upload(
            "folderId does not match earlier chunks",
        ));
    }
    Ok(())
}
