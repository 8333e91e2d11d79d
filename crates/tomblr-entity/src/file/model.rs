//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tomblr_core::types::{FileId, FolderId, UserId};

/// A file stored in Tomblr.
///
/// The blob behind `storage_key` is owned exclusively by this row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// File name, including extension.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Key of the blob in the object store. Never sent to clients.
    #[serde(skip_serializing)]
    pub storage_key: String,
    /// Owner.
    pub user_id: UserId,
    /// Containing folder, `None` at the root.
    pub folder_id: Option<FolderId>,
    /// Whether the file can be resolved through its share token.
    pub is_public: bool,
    /// Current share token, set only while public.
    #[serde(skip_serializing)]
    pub share_token: Option<String>,
    /// Sort key among siblings.
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone)]
pub struct CreateFile {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Key of the already-written blob.
    pub storage_key: String,
    /// Owner.
    pub user_id: UserId,
    /// Containing folder.
    pub folder_id: Option<FolderId>,
}

/// What an anonymous visitor sees for a shared file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFile {
    /// File identifier.
    pub id: FileId,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// Time-limited download URL.
    pub download_url: String,
}
