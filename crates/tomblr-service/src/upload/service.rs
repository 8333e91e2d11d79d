//! Single-request uploads and presigned direct uploads.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};

use tomblr_core::config::UploadConfig;
use tomblr_core::error::{AppError, ErrorKind};
use tomblr_core::result::AppResult;
use tomblr_core::traits::{ObjectStore, PresignedUpload};
use tomblr_core::types::FolderId;
use tomblr_database::store::FolderStore;
use tomblr_entity::file::{CreateFile, File};
use tomblr_entity::upload::DirectUpload;
use tomblr_storage::{ChunkStaging, keys};

use super::commit::{BlobCommitter, NewBlob};
use crate::context::RequestContext;
use crate::quota::QuotaLedger;

/// Simple upload parameters (single request with full file body).
#[derive(Debug, Clone)]
pub struct SimpleUpload {
    /// Target folder.
    pub folder_id: Option<FolderId>,
    /// File name.
    pub file_name: String,
    /// MIME type; `application/octet-stream` when absent.
    pub mime_type: Option<String>,
    /// File content bytes.
    pub data: Bytes,
}

/// Presigned direct upload parameters.
#[derive(Debug, Clone)]
pub struct DirectUploadRequest {
    /// File name.
    pub file_name: String,
    /// Size the client is about to write, when known.
    pub file_size: Option<u64>,
    /// Target folder.
    pub folder_id: Option<FolderId>,
}

/// Handles uploads that do not go through the chunk assembler.
#[derive(Debug, Clone)]
pub struct UploadService {
    committer: BlobCommitter,
    folders: Arc<dyn FolderStore>,
    objects: Arc<dyn ObjectStore>,
    staging: ChunkStaging,
    quota: QuotaLedger,
    config: UploadConfig,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        committer: BlobCommitter,
        folders: Arc<dyn FolderStore>,
        objects: Arc<dyn ObjectStore>,
        staging: ChunkStaging,
        quota: QuotaLedger,
        config: UploadConfig,
    ) -> Self {
        Self {
            committer,
            folders,
            objects,
            staging,
            quota,
            config,
        }
    }

    async fn require_folder(&self, ctx: &RequestContext, folder_id: Option<FolderId>) -> AppResult<()> {
        if let Some(folder_id) = folder_id {
            self.folders
                .find_owned(folder_id, ctx.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Folder not found"))?;
        }
        Ok(())
    }

    /// Performs a simple (single-request) file upload.
    pub async fn simple_upload(&self, ctx: &RequestContext, params: SimpleUpload) -> AppResult<File> {
        let name = params.file_name.trim();
        if name.is_empty() {
            return Err(AppError::validation("No file provided"));
        }

        self.require_folder(ctx, params.folder_id).await?;

        let file = self
            .committer
            .commit(
                ctx.user_id,
                NewBlob {
                    name: name.to_string(),
                    mime_type: params
                        .mime_type
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    folder_id: params.folder_id,
                    data: params.data,
                },
            )
            .await?;

        info!(user_id = %ctx.user_id, file_id = %file.id, "Simple upload completed");
        Ok(file)
    }

    /// Issue a presigned PUT target for a direct client upload.
    ///
    /// The written object only becomes a file once
    /// [`complete_direct`](Self::complete_direct) is called for its key.
    pub async fn presign_upload(
        &self,
        ctx: &RequestContext,
        req: DirectUploadRequest,
    ) -> AppResult<PresignedUpload> {
        let file_name = req.file_name.trim();
        if file_name.is_empty() {
            return Err(AppError::validation("fileName is required"));
        }
        self.require_folder(ctx, req.folder_id).await?;
        let announced = req.file_size.unwrap_or(1).max(1);
        self.quota.reserve(ctx.user_id, announced as i64).await?;

        let ttl = Duration::from_secs(self.config.upload_url_ttl_seconds);
        let key = keys::object_key(ctx.user_id, file_name);
        let target = self.objects.presigned_put(&key, ttl).await?;

        let issued_at = Utc::now();
        self.staging
            .save_direct(&DirectUpload {
                storage_key: target.key.clone(),
                user_id: ctx.user_id,
                file_name: file_name.to_string(),
                folder_id: req.folder_id,
                issued_at,
                expires_at: issued_at + chrono::Duration::seconds(ttl.as_secs() as i64),
            })
            .await?;

        debug!(user_id = %ctx.user_id, storage_key = %target.key, "Direct upload issued");
        Ok(target)
    }

    /// Turn the object the client wrote at `storage_key` into a file.
    ///
    /// The size is taken from the object store, charged against the quota,
    /// and the blob is deleted if it does not fit.
    pub async fn complete_direct(
        &self,
        ctx: &RequestContext,
        storage_key: &str,
        mime_type: Option<String>,
    ) -> AppResult<File> {
        if !storage_key.starts_with(&format!("{}/", ctx.user_id)) {
            return Err(AppError::not_found("Upload not found"));
        }
        let ticket = self
            .staging
            .take_direct(storage_key)
            .await?
            .filter(|t| t.user_id == ctx.user_id)
            .ok_or_else(|| AppError::not_found("Upload not found"))?;

        let meta = match self.objects.stat(storage_key).await {
            Ok(meta) => meta,
            Err(e) => {
                // Leave the ticket for a retry once the object is there.
                self.staging.save_direct(&ticket).await?;
                return Err(match e.kind {
                    ErrorKind::NotFound => {
                        AppError::incomplete_upload("Nothing has been uploaded to this URL yet")
                    }
                    _ => e,
                });
            }
        };

        let file = self
            .committer
            .adopt(
                ctx.user_id,
                CreateFile {
                    name: ticket.file_name,
                    size: meta.size_bytes as i64,
                    mime_type: mime_type
                        .or(meta.content_type)
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    storage_key: ticket.storage_key,
                    user_id: ctx.user_id,
                    folder_id: ticket.folder_id,
                },
            )
            .await?;

        info!(user_id = %ctx.user_id, file_id = %file.id, "Direct upload completed");
        Ok(file)
    }

    /// Delete blobs of direct uploads whose URL expired more than
    /// `retention` ago without being completed. Returns how many were purged.
    pub async fn purge_expired_direct(&self, retention: chrono::Duration) -> AppResult<usize> {
        let cutoff = Utc::now() - retention;
        let mut purged = 0;
        for ticket in self.staging.list_direct().await? {
            if ticket.expires_at >= cutoff {
                continue;
            }
            let Some(ticket) = self.staging.take_direct(&ticket.storage_key).await? else {
                continue;
            };
            match self.objects.delete(&ticket.storage_key).await {
                Ok(()) => purged += 1,
                Err(e) => {
                    warn!(storage_key = %ticket.storage_key, error = %e, "Failed to purge direct upload");
                    self.staging.save_direct(&ticket).await?;
                }
            }
        }
        if purged > 0 {
            info!(purged, "Purged expired direct uploads");
        }
        Ok(purged)
    }
}
