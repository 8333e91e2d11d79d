//! File repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::types::{FileId, FolderId, UserId};
use tomblr_entity::file::{CreateFile, File};

use super::db_err;
use crate::store::FileStore;

/// Sibling order: explicit sort key, then creation time, then id.
const DISPLAY_ORDER: &str = "ORDER BY sort_order ASC, created_at ASC, id ASC";

/// Repository for file rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn create(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, name, size, mime_type, storage_key, user_id, folder_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(FileId::new())
        .bind(&data.name)
        .bind(data.size)
        .bind(&data.mime_type)
        .bind(&data.storage_key)
        .bind(data.user_id)
        .bind(data.folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::not_found("Folder not found")
            }
            _ => db_err("Failed to create file")(e),
        })
    }

    async fn find_owned(&self, id: FileId, user_id: UserId) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find file"))
    }

    async fn find_by_share_token(&self, token: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE share_token = $1 AND is_public")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to resolve share token"))
    }

    async fn list_children(
        &self,
        user_id: UserId,
        folder_id: Option<FolderId>,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(&format!(
            "SELECT * FROM files WHERE user_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
             {DISPLAY_ORDER}"
        ))
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list files"))
    }

    async fn list_in_folders(
        &self,
        user_id: UserId,
        folder_ids: &[FolderId],
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE user_id = $1 AND folder_id = ANY($2)")
            .bind(user_id)
            .bind(folder_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list files in folders"))
    }

    async fn delete_owned(&self, id: FileId, user_id: UserId) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("DELETE FROM files WHERE id = $1 AND user_id = $2 RETURNING *")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to delete file"))
    }

    async fn set_share_token(
        &self,
        id: FileId,
        user_id: UserId,
        token: Option<&str>,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET share_token = $3, is_public = ($3 IS NOT NULL), updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update share token"))
    }

    async fn update_order(&self, id: FileId, user_id: UserId, order: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE files SET sort_order = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(order)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to reorder file"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count files"))
    }
}
