//! Writing a blob and its metadata row as one unit.
//!
//! The object store and the metadata store share no transaction. The
//! sequence here (check quota, put blob, create row, charge quota) undoes
//! the earlier steps whenever a later one fails, so a failed commit leaves
//! neither a blob without a row nor a row without a charge.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, warn};

use tomblr_core::result::AppResult;
use tomblr_core::traits::ObjectStore;
use tomblr_core::types::{FolderId, UserId};
use tomblr_database::store::FileStore;
use tomblr_entity::file::{CreateFile, File};
use tomblr_storage::keys;

use crate::quota::QuotaLedger;

/// A fully assembled upload waiting to be stored.
#[derive(Debug, Clone)]
pub struct NewBlob {
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Destination folder.
    pub folder_id: Option<FolderId>,
    /// File contents.
    pub data: Bytes,
}

/// Stores blobs and creates the matching file rows.
#[derive(Debug, Clone)]
pub struct BlobCommitter {
    files: Arc<dyn FileStore>,
    objects: Arc<dyn ObjectStore>,
    quota: QuotaLedger,
}

impl BlobCommitter {
    /// Creates a new committer.
    pub fn new(files: Arc<dyn FileStore>, objects: Arc<dyn ObjectStore>, quota: QuotaLedger) -> Self {
        Self {
            files,
            objects,
            quota,
        }
    }

    /// Store `blob` for `user_id` and return the created file row.
    pub async fn commit(&self, user_id: UserId, blob: NewBlob) -> AppResult<File> {
        let size = blob.data.len() as i64;
        self.quota.reserve(user_id, size).await?;

        let storage_key = keys::object_key(user_id, &blob.name);
        self.objects
            .put(&storage_key, blob.data, &blob.mime_type)
            .await?;

        self.record(
            user_id,
            CreateFile {
                name: blob.name,
                size,
                mime_type: blob.mime_type,
                storage_key,
                user_id,
                folder_id: blob.folder_id,
            },
        )
        .await
    }

    /// Take ownership of a blob the client already wrote at `blob.storage_key`.
    ///
    /// Any failure deletes the blob, so it is either charged and referenced
    /// by a row or gone.
    pub async fn adopt(&self, user_id: UserId, blob: CreateFile) -> AppResult<File> {
        if let Err(e) = self.quota.reserve(user_id, blob.size).await {
            self.discard_blob(&blob.storage_key).await;
            return Err(e);
        }
        self.record(user_id, blob).await
    }

    /// Create the row for a stored blob and charge its size, undoing both
    /// and deleting the blob when either step fails.
    async fn record(&self, user_id: UserId, data: CreateFile) -> AppResult<File> {
        let size = data.size;
        let storage_key = data.storage_key.clone();

        let file = match self.files.create(&data).await {
            Ok(file) => file,
            Err(e) => {
                self.discard_blob(&storage_key).await;
                return Err(e);
            }
        };

        if let Err(e) = self.quota.commit(user_id, size).await {
            match self.files.delete_owned(file.id, user_id).await {
                Ok(_) => self.discard_blob(&storage_key).await,
                Err(undo) => error!(
                    file_id = %file.id,
                    storage_key = %storage_key,
                    error = %undo,
                    "Failed to roll back file row after quota commit failure"
                ),
            }
            return Err(e);
        }

        info!(
            user_id = %user_id,
            file_id = %file.id,
            size,
            "File committed"
        );
        Ok(file)
    }

    async fn discard_blob(&self, storage_key: &str) {
        if let Err(e) = self.objects.delete(storage_key).await {
            warn!(storage_key, error = %e, "Failed to delete blob during rollback");
        }
    }
}
