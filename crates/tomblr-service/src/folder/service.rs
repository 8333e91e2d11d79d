//! Folder creation, listing and cascading deletion.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::traits::ObjectStore;
use tomblr_core::types::FolderId;
use tomblr_database::store::{FileStore, FolderStore};
use tomblr_entity::folder::{CreateFolder, DEFAULT_FOLDER_COLOR, Folder, FolderContents};

use super::tree::FolderArena;
use crate::context::RequestContext;
use crate::quota::QuotaLedger;

/// Longest accepted folder name.
const MAX_NAME_LEN: usize = 255;

/// Outcome of a folder delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDeletion {
    /// Folders removed, including the target.
    pub folders_removed: usize,
    /// Files removed from the subtree.
    pub files_removed: usize,
    /// Bytes given back to the owner's quota.
    pub bytes_released: i64,
}

/// Manages the folder hierarchy.
#[derive(Debug, Clone)]
pub struct FolderService {
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    objects: Arc<dyn ObjectStore>,
    quota: QuotaLedger,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        folders: Arc<dyn FolderStore>,
        files: Arc<dyn FileStore>,
        objects: Arc<dyn ObjectStore>,
        quota: QuotaLedger,
    ) -> Self {
        Self {
            folders,
            files,
            objects,
            quota,
        }
    }

    /// Create a folder under `parent_id`, or at the root.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        name: &str,
        color: Option<&str>,
        parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "Folder name must be 1 to {MAX_NAME_LEN} characters"
            )));
        }
        let color = match color.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) if is_hex_color(c) => c.to_string(),
            Some(c) => return Err(AppError::validation(format!("Invalid color: {c}"))),
            None => DEFAULT_FOLDER_COLOR.to_string(),
        };

        if let Some(parent) = parent_id {
            self.require_owned(ctx, parent).await?;
        }

        let folder = self
            .folders
            .create(&CreateFolder {
                name: name.to_string(),
                color,
                user_id: ctx.user_id,
                parent_id,
            })
            .await?;

        info!(user_id = %ctx.user_id, folder_id = %folder.id, "Folder created");
        Ok(folder)
    }

    /// Direct children of `parent_id` (or of the root), in display order.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FolderId>,
    ) -> AppResult<FolderContents> {
        if let Some(parent) = parent_id {
            self.require_owned(ctx, parent).await?;
        }
        let (folders, files) = tokio::try_join!(
            self.folders.list_children(ctx.user_id, parent_id),
            self.files.list_children(ctx.user_id, parent_id),
        )?;
        Ok(FolderContents { folders, files })
    }

    /// Delete a folder, everything beneath it and every blob they reference.
    ///
    /// Metadata is always removed. When some blobs could not be deleted the
    /// call fails with `PartialDeleteFailure` whose details list the keys
    /// left behind.
    pub async fn delete(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<FolderDeletion> {
        self.require_owned(ctx, folder_id).await?;

        let arena = FolderArena::build(&self.folders.list_all(ctx.user_id).await?);
        let subtree = arena.subtree(folder_id);

        let listed = self.files.list_in_folders(ctx.user_id, &subtree).await?;
        let mut handled: HashSet<String> = HashSet::with_capacity(listed.len());
        let mut failed_keys = Vec::new();
        for file in &listed {
            self.delete_blob(&file.storage_key, &mut failed_keys).await;
            handled.insert(file.storage_key.clone());
        }

        let removed = self
            .folders
            .delete_subtree(folder_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        for file in removed.files.iter().filter(|f| !handled.contains(&f.storage_key)) {
            // Landed in the subtree after the listing above.
            self.delete_blob(&file.storage_key, &mut failed_keys).await;
        }

        let bytes_released: i64 = removed.files.iter().map(|f| f.size).sum();
        self.quota.release(ctx.user_id, bytes_released).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            folders = removed.folders.len(),
            files = removed.files.len(),
            bytes_released,
            failed_blobs = failed_keys.len(),
            "Folder deleted"
        );

        if !failed_keys.is_empty() {
            return Err(AppError::partial_delete(
                format!(
                    "Folder deleted but {} stored object(s) could not be removed",
                    failed_keys.len()
                ),
                failed_keys,
            ));
        }

        Ok(FolderDeletion {
            folders_removed: removed.folders.len(),
            files_removed: removed.files.len(),
            bytes_released,
        })
    }

    async fn require_owned(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        self.folders
            .find_owned(folder_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    async fn delete_blob(&self, key: &str, failed: &mut Vec<String>) {
        if let Err(e) = self.objects.delete(key).await {
            warn!(storage_key = key, error = %e, "Failed to delete blob");
            failed.push(key.to_string());
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use bytes::Bytes;
    use tomblr_core::error::ErrorKind;

    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tomblr_core::types::UserId;
    use tomblr_database::{MemoryStore, RemovedSubtree};

    use crate::BlobCommitter;
    use crate::upload::{NewBlob, SimpleUpload};

    /// Folder store that grows a subfolder holding a committed file the
    /// first time the tree is listed, as a concurrent upload would.
    #[derive(Debug)]
    struct GrowingTree {
        inner: Arc<MemoryStore>,
        committer: BlobCommitter,
        parent: FolderId,
        user_id: UserId,
        grown: AtomicBool,
    }

    #[async_trait]
    impl FolderStore for GrowingTree {
        async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
            FolderStore::create(&*self.inner, data).await
        }

        async fn find_owned(&self, id: FolderId, user_id: UserId) -> AppResult<Option<Folder>> {
            FolderStore::find_owned(&*self.inner, id, user_id).await
        }

        async fn list_children(
            &self,
            user_id: UserId,
            parent_id: Option<FolderId>,
        ) -> AppResult<Vec<Folder>> {
            FolderStore::list_children(&*self.inner, user_id, parent_id).await
        }

        async fn list_all(&self, user_id: UserId) -> AppResult<Vec<Folder>> {
            let listed = FolderStore::list_all(&*self.inner, user_id).await?;
            if !self.grown.swap(true, Ordering::SeqCst) {
                let late = FolderStore::create(
                    &*self.inner,
                    &CreateFolder {
                        name: "late".into(),
                        color: DEFAULT_FOLDER_COLOR.into(),
                        user_id: self.user_id,
                        parent_id: Some(self.parent),
                    },
                )
                .await?;
                self.committer
                    .commit(
                        self.user_id,
                        NewBlob {
                            name: "late.bin".into(),
                            mime_type: "application/octet-stream".into(),
                            folder_id: Some(late.id),
                            data: Bytes::from_static(b"0123456789"),
                        },
                    )
                    .await?;
            }
            Ok(listed)
        }

        async fn delete_subtree(
            &self,
            id: FolderId,
            user_id: UserId,
        ) -> AppResult<Option<RemovedSubtree>> {
            self.inner.delete_subtree(id, user_id).await
        }

        async fn update_order(&self, id: FolderId, user_id: UserId, order: i32) -> AppResult<bool> {
            FolderStore::update_order(&*self.inner, id, user_id, order).await
        }
    }

    async fn upload_into(fx: &Fixture, folder: Option<FolderId>, data: &'static [u8]) -> String {
        fx.uploads
            .simple_upload(
                &fx.ctx(),
                SimpleUpload {
                    folder_id: folder,
                    file_name: "f.txt".into(),
                    mime_type: Some("text/plain".into()),
                    data: Bytes::from_static(data),
                },
            )
            .await
            .unwrap()
            .storage_key
    }

    #[tokio::test]
    async fn test_create_defaults_color_and_validates() {
        let fx = Fixture::new().await;
        let folder = fx.folders.create(&fx.ctx(), " Docs ", None, None).await.unwrap();
        assert_eq!(folder.name, "Docs");
        assert_eq!(folder.color, DEFAULT_FOLDER_COLOR);

        let err = fx
            .folders
            .create(&fx.ctx(), "x", Some("red"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(fx.folders.create(&fx.ctx(), "  ", None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_sibling_names_allowed() {
        let fx = Fixture::new().await;
        fx.folders.create(&fx.ctx(), "Same", None, None).await.unwrap();
        fx.folders.create(&fx.ctx(), "Same", None, None).await.unwrap();
        assert_eq!(fx.folders.list_children(&fx.ctx(), None).await.unwrap().folders.len(), 2);
    }

    #[tokio::test]
    async fn test_parent_must_be_owned() {
        let fx = Fixture::new().await;
        let other = fx.other_user("o@example.com").await;
        let theirs = fx
            .folders
            .create(&RequestContext::new(other.id, other.role), "T", None, None)
            .await
            .unwrap();

        let err = fx
            .folders
            .create(&fx.ctx(), "mine", None, Some(theirs.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_children_is_direct_only() {
        let fx = Fixture::new().await;
        let a = fx.folders.create(&fx.ctx(), "A", None, None).await.unwrap();
        let b = fx.folders.create(&fx.ctx(), "B", None, Some(a.id)).await.unwrap();
        fx.folders.create(&fx.ctx(), "C", None, Some(b.id)).await.unwrap();
        upload_into(&fx, Some(a.id), b"1").await;
        upload_into(&fx, Some(b.id), b"2").await;

        let root = fx.folders.list_children(&fx.ctx(), None).await.unwrap();
        assert_eq!(root.folders.len(), 1);
        assert!(root.files.is_empty());

        let inside = fx.folders.list_children(&fx.ctx(), Some(a.id)).await.unwrap();
        assert_eq!(inside.folders.len(), 1);
        assert_eq!(inside.folders[0].id, b.id);
        assert_eq!(inside.files.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_releases_quota() {
        let fx = Fixture::new().await;
        let a = fx.folders.create(&fx.ctx(), "A", None, None).await.unwrap();
        let b = fx.folders.create(&fx.ctx(), "B", None, Some(a.id)).await.unwrap();
        let c = fx.folders.create(&fx.ctx(), "C", None, Some(b.id)).await.unwrap();
        upload_into(&fx, Some(a.id), b"aaaa").await;
        upload_into(&fx, Some(c.id), b"cc").await;
        let kept = upload_into(&fx, None, b"r").await;

        let outcome = fx.folders.delete(&fx.ctx(), a.id).await.unwrap();
        assert_eq!(outcome.folders_removed, 3);
        assert_eq!(outcome.files_removed, 2);
        assert_eq!(outcome.bytes_released, 6);

        assert_eq!(fx.objects.len().await, 1);
        assert!(fx.objects.contains(&kept).await);
        assert_eq!(fx.quota.usage(fx.user.id).await.unwrap().used, 1);
        assert_eq!(fx.metadata.sum_file_sizes(fx.user.id).await, 1);
        assert!(fx.folders.list_children(&fx.ctx(), None).await.unwrap().folders.is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_blobs_left_behind() {
        let fx = Fixture::new().await;
        let a = fx.folders.create(&fx.ctx(), "A", None, None).await.unwrap();
        let stuck = upload_into(&fx, Some(a.id), b"xx").await;
        upload_into(&fx, Some(a.id), b"yy").await;
        fx.objects.fail_delete_of(stuck.clone()).await;

        let err = fx.folders.delete(&fx.ctx(), a.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PartialDeleteFailure);
        assert_eq!(err.details, vec![stuck]);

        // Metadata and quota are still settled.
        assert_eq!(fx.metadata.sum_file_sizes(fx.user.id).await, 0);
        assert_eq!(fx.quota.usage(fx.user.id).await.unwrap().used, 0);
        assert_eq!(
            fx.folders.list_children(&fx.ctx(), Some(a.id)).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_settles_subfolder_created_during_delete() {
        let fx = Fixture::new().await;
        let a = fx.folders.create(&fx.ctx(), "A", None, None).await.unwrap();
        upload_into(&fx, Some(a.id), b"abc").await;

        let tree = Arc::new(GrowingTree {
            inner: fx.metadata.clone(),
            committer: fx.committer.clone(),
            parent: a.id,
            user_id: fx.user.id,
            grown: AtomicBool::new(false),
        });
        let service = FolderService::new(tree, fx.metadata.clone(), fx.objects.clone(), fx.quota.clone());

        let outcome = service.delete(&fx.ctx(), a.id).await.unwrap();
        assert_eq!(outcome.folders_removed, 2);
        assert_eq!(outcome.files_removed, 2);
        assert_eq!(outcome.bytes_released, 13);

        assert_eq!(fx.objects.len().await, 0);
        assert_eq!(fx.metadata.sum_file_sizes(fx.user.id).await, 0);
        assert_eq!(fx.quota.usage(fx.user.id).await.unwrap().used, 0);
    }

    #[tokio::test]
    async fn test_delete_foreign_folder_is_not_found() {
        let fx = Fixture::new().await;
        let other = fx.other_user("o@example.com").await;
        let theirs = fx
            .folders
            .create(&RequestContext::new(other.id, other.role), "T", None, None)
            .await
            .unwrap();

        let err = fx.folders.delete(&fx.ctx(), theirs.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
