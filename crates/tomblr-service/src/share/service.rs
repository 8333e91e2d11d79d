//! Share token issuance, resolution and revocation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use tomblr_auth::token::generate_share_token;
use tomblr_core::config::{ShareConfig, UploadConfig};
use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::traits::ObjectStore;
use tomblr_core::types::FileId;
use tomblr_database::store::FileStore;
use tomblr_entity::file::SharedFile;

use crate::context::RequestContext;

/// A freshly issued public link.
#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    /// The share token.
    pub token: String,
    /// Public page for the token.
    pub url: String,
}

/// Mints and resolves public share tokens.
#[derive(Debug, Clone)]
pub struct ShareService {
    files: Arc<dyn FileStore>,
    objects: Arc<dyn ObjectStore>,
    public_base_url: String,
    download_ttl: Duration,
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        files: Arc<dyn FileStore>,
        objects: Arc<dyn ObjectStore>,
        share: &ShareConfig,
        upload: &UploadConfig,
    ) -> Self {
        Self {
            files,
            objects,
            public_base_url: share.public_base_url.trim_end_matches('/').to_string(),
            download_ttl: Duration::from_secs(upload.download_url_ttl_seconds),
        }
    }

    /// Publish a file under a new token. Issuing again rotates the token.
    pub async fn issue(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<ShareLink> {
        let token = generate_share_token();
        self.files
            .set_share_token(file_id, ctx.user_id, Some(&token))
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        info!(user_id = %ctx.user_id, file_id = %file_id, "Share link issued");
        Ok(ShareLink {
            url: format!("{}/share/{}", self.public_base_url, token),
            token,
        })
    }

    /// Look up a public file by token. Needs no authentication.
    pub async fn resolve(&self, token: &str) -> AppResult<SharedFile> {
        let file = self
            .files
            .find_by_share_token(token)
            .await?
            .filter(|f| f.is_public)
            .ok_or_else(|| AppError::not_found("Shared file not found"))?;

        let download_url = self
            .objects
            .presigned_get(&file.storage_key, self.download_ttl)
            .await?;

        Ok(SharedFile {
            id: file.id,
            name: file.name,
            size: file.size,
            mime_type: file.mime_type,
            created_at: file.created_at,
            download_url,
        })
    }

    /// Make a file private again.
    pub async fn revoke(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<()> {
        self.files
            .set_share_token(file_id, ctx.user_id, None)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        info!(user_id = %ctx.user_id, file_id = %file_id, "Share link revoked");
        Ok(())
    }
}
