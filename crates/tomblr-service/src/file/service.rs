//! Owner-scoped file operations.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use tomblr_core::config::UploadConfig;
use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::traits::ObjectStore;
use tomblr_core::types::{FileId, FolderId};
use tomblr_database::store::{FileStore, FolderStore};
use tomblr_entity::file::{File, ItemKind, PositionUpdate};
use tomblr_entity::user::StorageUsage;

use crate::context::RequestContext;
use crate::quota::QuotaLedger;

/// A file together with a time-limited download URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDownload {
    /// File metadata.
    pub file: File,
    /// Presigned GET URL.
    pub url: String,
    /// Seconds until `url` expires.
    pub expires_in: u64,
}

/// Handles reads, deletes and reordering of files the caller owns.
#[derive(Debug, Clone)]
pub struct FileService {
    files: Arc<dyn FileStore>,
    folders: Arc<dyn FolderStore>,
    objects: Arc<dyn ObjectStore>,
    quota: QuotaLedger,
    config: UploadConfig,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        files: Arc<dyn FileStore>,
        folders: Arc<dyn FolderStore>,
        objects: Arc<dyn ObjectStore>,
        quota: QuotaLedger,
        config: UploadConfig,
    ) -> Self {
        Self {
            files,
            folders,
            objects,
            quota,
            config,
        }
    }

    /// Gets a single file the caller owns.
    pub async fn get(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<File> {
        self.files
            .find_owned(file_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// File metadata plus a presigned download URL.
    pub async fn download_url(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<FileDownload> {
        let file = self.get(ctx, file_id).await?;
        let ttl = self.config.download_url_ttl_seconds;
        let url = self
            .objects
            .presigned_get(&file.storage_key, Duration::from_secs(ttl))
            .await?;
        Ok(FileDownload {
            file,
            url,
            expires_in: ttl,
        })
    }

    /// Delete a file, give back its bytes, then remove its blob.
    ///
    /// A blob that cannot be removed is logged and left for manual cleanup;
    /// the caller still sees success because the file is gone.
    pub async fn delete(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<File> {
        let file = self
            .files
            .delete_owned(file_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        self.quota.release(ctx.user_id, file.size).await?;

        if let Err(e) = self.objects.delete(&file.storage_key).await {
            warn!(
                file_id = %file.id,
                storage_key = %file.storage_key,
                error = %e,
                "Failed to delete blob of deleted file"
            );
        }

        info!(user_id = %ctx.user_id, file_id = %file.id, size = file.size, "File deleted");
        Ok(file)
    }

    /// Files directly inside `folder_id` (or at the root).
    pub async fn list(&self, ctx: &RequestContext, folder_id: Option<FolderId>) -> AppResult<Vec<File>> {
        if let Some(folder_id) = folder_id {
            self.folders
                .find_owned(folder_id, ctx.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Folder not found"))?;
        }
        self.files.list_children(ctx.user_id, folder_id).await
    }

    /// Apply new sort keys. Items the caller does not own are skipped.
    /// Returns how many items were updated.
    pub async fn update_positions(
        &self,
        ctx: &RequestContext,
        items: &[PositionUpdate],
    ) -> AppResult<usize> {
        let mut updated = 0;
        for item in items {
            let changed = match item.kind {
                ItemKind::File => {
                    self.files
                        .update_order(FileId::from(item.id), ctx.user_id, item.order)
                        .await?
                }
                ItemKind::Folder => {
                    self.folders
                        .update_order(FolderId::from(item.id), ctx.user_id, item.order)
                        .await?
                }
            };
            if changed {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Storage consumption of the caller.
    pub async fn usage(&self, ctx: &RequestContext) -> AppResult<StorageUsage> {
        self.quota.usage(ctx.user_id).await
    }
}
