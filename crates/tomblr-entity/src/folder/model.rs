//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tomblr_core::types::{FolderId, UserId};

use crate::file::File;

/// Color assigned when the caller does not pick one.
pub const DEFAULT_FOLDER_COLOR: &str = "#6D28D9";

/// A folder in a user's tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Display name. Siblings may share a name.
    pub name: String,
    /// Display color as a hex string.
    pub color: String,
    /// Owner.
    pub user_id: UserId,
    /// Parent folder, `None` at the root.
    pub parent_id: Option<FolderId>,
    /// Sort key among siblings.
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new folder.
#[derive(Debug, Clone)]
pub struct CreateFolder {
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Owner.
    pub user_id: UserId,
    /// Parent folder.
    pub parent_id: Option<FolderId>,
}

/// Direct children of one folder (or of the root).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderContents {
    /// Subfolders, in display order.
    pub folders: Vec<Folder>,
    /// Files, in display order.
    pub files: Vec<File>,
}
