//! Folder repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::types::{FolderId, UserId};
use tomblr_entity::file::File;
use tomblr_entity::folder::{CreateFolder, Folder};

use super::db_err;
use crate::store::{FolderStore, RemovedSubtree};

/// Repository for folder rows.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for FolderRepository {
    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, name, color, user_id, parent_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(FolderId::new())
        .bind(&data.name)
        .bind(&data.color)
        .bind(data.user_id)
        .bind(data.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::not_found("Parent folder not found")
            }
            _ => db_err("Failed to create folder")(e),
        })
    }

    async fn find_owned(&self, id: FolderId, user_id: UserId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find folder"))
    }

    async fn list_children(
        &self,
        user_id: UserId,
        parent_id: Option<FolderId>,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE user_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             ORDER BY sort_order ASC, created_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list folders"))
    }

    async fn list_all(&self, user_id: UserId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to load folder tree"))
    }

    async fn delete_subtree(
        &self,
        id: FolderId,
        user_id: UserId,
    ) -> AppResult<Option<RemovedSubtree>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin folder delete"))?;

        // Lock the subtree until it stops growing. A locked folder cannot
        // gain children or files until this transaction ends.
        let mut locked: Vec<FolderId> = Vec::new();
        loop {
            let ids = sqlx::query_scalar::<_, FolderId>(
                "WITH RECURSIVE tree AS ( \
                    SELECT id FROM folders WHERE id = $1 AND user_id = $2 \
                    UNION ALL \
                    SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
                 ) SELECT fo.id FROM folders fo WHERE fo.id IN (SELECT id FROM tree) \
                 ORDER BY fo.id FOR UPDATE OF fo",
            )
            .bind(id)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to lock folder tree"))?;

            if ids.is_empty() {
                return Ok(None);
            }
            if ids == locked {
                break;
            }
            locked = ids;
        }

        let files = sqlx::query_as::<_, File>(
            "DELETE FROM files WHERE user_id = $1 AND folder_id = ANY($2) RETURNING *",
        )
        .bind(user_id)
        .bind(&locked)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("Failed to delete files in folder tree"))?;

        sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete folder"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit folder delete"))?;

        Ok(Some(RemovedSubtree {
            folders: locked,
            files,
        }))
    }

    async fn update_order(&self, id: FolderId, user_id: UserId, order: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE folders SET sort_order = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(order)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to reorder folder"))?;
        Ok(result.rows_affected() > 0)
    }
}
