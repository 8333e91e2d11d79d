//! Presigned uploads that go straight to the object store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tomblr_core::types::{FolderId, UserId};

/// A presigned PUT target that was handed out and not yet completed.
///
/// Until the client completes it the blob at `storage_key` belongs to no
/// file row and is charged to nobody; the sweeper deletes it once the
/// ticket has been expired for longer than the retention window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectUpload {
    /// Key the client was allowed to write.
    pub storage_key: String,
    /// Owner.
    pub user_id: UserId,
    /// File name for the row created on completion.
    pub file_name: String,
    /// Destination folder.
    pub folder_id: Option<FolderId>,
    /// When the URL was issued.
    pub issued_at: DateTime<Utc>,
    /// When the URL stops being accepted.
    pub expires_at: DateTime<Utc>,
}
