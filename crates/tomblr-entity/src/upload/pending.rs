//! Manifest of a chunked upload that has not been finalized yet.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tomblr_core::types::{FolderId, UserId};

use super::id::UploadId;

/// Target metadata every chunk of an upload must agree on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Final file name.
    pub file_name: String,
    /// Final MIME type.
    pub mime_type: String,
    /// Total size the client announced.
    pub declared_size: u64,
    /// Number of chunks the client will send.
    pub total_chunks: u32,
    /// Destination folder.
    pub folder_id: Option<FolderId>,
}

/// Staged state of one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUpload {
    /// Upload identifier.
    pub upload_id: UploadId,
    /// Owner; only this user may add chunks or finalize.
    pub user_id: UserId,
    /// Target metadata fixed by the first chunk.
    pub meta: ChunkMeta,
    /// Received chunk index to byte length, ordered by index.
    pub chunks: BTreeMap<u32, u64>,
    /// When the first chunk arrived.
    pub created_at: DateTime<Utc>,
    /// When the last chunk arrived.
    pub last_activity: DateTime<Utc>,
}

impl PendingUpload {
    /// Start tracking a new upload.
    pub fn new(upload_id: UploadId, user_id: UserId, meta: ChunkMeta) -> Self {
        let now = Utc::now();
        Self {
            upload_id,
            user_id,
            meta,
            chunks: BTreeMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Bytes received so far across all distinct indices.
    pub fn bytes_received(&self) -> u64 {
        self.chunks.values().sum()
    }

    /// Whether every index in `0..total_chunks` has arrived.
    pub fn is_complete(&self) -> bool {
        self.missing_chunks().is_empty()
    }

    /// Indices that have not arrived yet, ascending.
    pub fn missing_chunks(&self) -> Vec<u32> {
        (0..self.meta.total_chunks)
            .filter(|index| !self.chunks.contains_key(index))
            .collect()
    }

    /// Record a chunk, replacing any earlier attempt at the same index.
    pub fn record_chunk(&mut self, index: u32, len: u64) {
        self.chunks.insert(index, len);
        self.last_activity = Utc::now();
    }
}

/// Result of accepting one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkReceipt {
    /// Upload the chunk belongs to.
    pub upload_id: UploadId,
    /// Index that was stored.
    pub chunk_index: u32,
    /// Distinct chunks received so far.
    pub chunks_received: u32,
    /// Expected chunk count.
    pub total_chunks: u32,
    /// Cumulative bytes received.
    pub bytes_received: u64,
    /// Whether every expected chunk is now present.
    pub complete: bool,
}
