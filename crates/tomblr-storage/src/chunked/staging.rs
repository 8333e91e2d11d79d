//! Filesystem staging area for chunk bytes and upload manifests.
//!
//! Layout: `{root}/{upload_id}/{index:06}.part` for chunk bytes and
//! `{root}/{upload_id}/manifest.json` for the [`PendingUpload`] record.
//! Tickets of presigned direct uploads live in `{root}/.direct/`, a name
//! no upload id can take.
//! Every write lands in a temporary file first and is renamed into
//! place, so a retried chunk replaces the earlier attempt whole.

use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use tomblr_core::error::{AppError, ErrorKind};
use tomblr_core::result::AppResult;
use tomblr_entity::upload::{DirectUpload, PendingUpload, UploadId};

const MANIFEST_FILE: &str = "manifest.json";
const DIRECT_DIR: &str = ".direct";

/// Staging area rooted at a local directory.
#[derive(Debug, Clone)]
pub struct ChunkStaging {
    root: PathBuf,
}

impl ChunkStaging {
    /// Create a staging area rooted at `root`. Nothing is touched on disk
    /// until [`init`](Self::init) or the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory.
    pub async fn init(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                format!("Failed to create staging root: {}", self.root.display()),
                e,
            )
        })
    }

    /// Root directory of the staging area.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn upload_dir(&self, upload_id: &UploadId) -> PathBuf {
        self.root.join(upload_id.as_str())
    }

    fn chunk_path(&self, upload_id: &UploadId, index: u32) -> PathBuf {
        self.upload_dir(upload_id).join(format!("{index:06}.part"))
    }

    fn manifest_path(&self, upload_id: &UploadId) -> PathBuf {
        self.upload_dir(upload_id).join(MANIFEST_FILE)
    }

    fn direct_path(&self, storage_key: &str) -> AppResult<PathBuf> {
        let valid = !storage_key.is_empty()
            && storage_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/'));
        if !valid {
            return Err(AppError::validation("Invalid storage key"));
        }
        Ok(self
            .root
            .join(DIRECT_DIR)
            .join(format!("{}.json", storage_key.replace('/', "_"))))
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    /// Persist the bytes of chunk `index`, replacing any earlier attempt.
    pub async fn write_chunk(
        &self,
        upload_id: &UploadId,
        index: u32,
        data: &[u8],
    ) -> AppResult<u64> {
        let path = self.chunk_path(upload_id, index);
        self.write_atomic(&path, data).await.map_err(|e| {
            AppError::chunk_write_failed(
                format!("Failed to stage chunk {index} of upload {upload_id}"),
                e,
            )
        })?;
        debug!(upload_id = %upload_id, index, bytes = data.len(), "Staged chunk");
        Ok(data.len() as u64)
    }

    /// Read back chunk `index`.
    pub async fn read_chunk(&self, upload_id: &UploadId, index: u32) -> AppResult<Bytes> {
        let path = self.chunk_path(upload_id, index);
        fs::read(&path).await.map(Bytes::from).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::incomplete_upload(format!(
                    "Chunk {index} of upload {upload_id} is missing from staging"
                ))
            } else {
                AppError::with_source(
                    ErrorKind::StorageUnavailable,
                    format!("Failed to read chunk {index} of upload {upload_id}"),
                    e,
                )
            }
        })
    }

    /// Write the manifest for `pending`.
    pub async fn save_manifest(&self, pending: &PendingUpload) -> AppResult<()> {
        let json = serde_json::to_vec(pending)?;
        let path = self.manifest_path(&pending.upload_id);
        self.write_atomic(&path, &json).await.map_err(|e| {
            AppError::chunk_write_failed(
                format!("Failed to record manifest of upload {}", pending.upload_id),
                e,
            )
        })
    }

    /// Load the manifest of `upload_id`, or `None` if the upload is unknown.
    pub async fn load_manifest(&self, upload_id: &UploadId) -> AppResult<Option<PendingUpload>> {
        let path = self.manifest_path(upload_id);
        match fs::read(&path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageUnavailable,
                format!("Failed to read manifest of upload {upload_id}"),
                e,
            )),
        }
    }

    /// Remove every staged artifact of `upload_id`. A missing directory is fine.
    pub async fn discard(&self, upload_id: &UploadId) -> AppResult<()> {
        match fs::remove_dir_all(self.upload_dir(upload_id)).await {
            Ok(()) => {
                debug!(upload_id = %upload_id, "Discarded staged upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageUnavailable,
                format!("Failed to discard upload {upload_id}"),
                e,
            )),
        }
    }

    /// Every readable manifest in the staging area.
    ///
    /// Directories without a manifest or with a corrupt one are skipped
    /// with a warning.
    pub async fn list_manifests(&self) -> AppResult<Vec<PendingUpload>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::from(e)),
        };

        let mut manifests = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Ok(upload_id) = UploadId::parse(name) else {
                continue;
            };
            match self.load_manifest(&upload_id).await {
                Ok(Some(pending)) => manifests.push(pending),
                Ok(None) => {}
                Err(e) => warn!(upload_id = %upload_id, error = %e, "Skipping unreadable manifest"),
            }
        }
        Ok(manifests)
    }

    /// Record an issued direct-upload ticket.
    pub async fn save_direct(&self, ticket: &DirectUpload) -> AppResult<()> {
        let json = serde_json::to_vec(ticket)?;
        let path = self.direct_path(&ticket.storage_key)?;
        self.write_atomic(&path, &json).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                format!("Failed to record direct upload {}", ticket.storage_key),
                e,
            )
        })
    }

    /// Remove and return the ticket for `storage_key`.
    ///
    /// Of several concurrent callers at most one gets the ticket.
    pub async fn take_direct(&self, storage_key: &str) -> AppResult<Option<DirectUpload>> {
        let path = self.direct_path(storage_key)?;
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::from(e)),
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::from(e)),
        }
    }

    /// Every readable direct-upload ticket.
    pub async fn list_direct(&self) -> AppResult<Vec<DirectUpload>> {
        let mut entries = match fs::read_dir(self.root.join(DIRECT_DIR)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::from(e)),
        };

        let mut tickets = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read(&path)
                .await
                .map_err(AppError::from)
                .and_then(|raw| Ok(serde_json::from_slice::<DirectUpload>(&raw)?));
            match parsed {
                Ok(ticket) => tickets.push(ticket),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable ticket"),
            }
        }
        Ok(tickets)
    }

    /// Concatenate chunks `0..total_chunks` in index order.
    pub async fn concat(&self, upload_id: &UploadId, total_chunks: u32) -> AppResult<Bytes> {
        let mut buf = BytesMut::new();
        for index in 0..total_chunks {
            let chunk = self.read_chunk(upload_id, index).await?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}
