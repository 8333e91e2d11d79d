//! Drag-and-drop reordering payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which table a reordered item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A file row.
    File,
    /// A folder row.
    Folder,
}

/// New sort position for one file or folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Identifier of the file or folder.
    pub id: Uuid,
    /// Which kind of item `id` refers to.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// New sort key.
    pub order: i32,
}
