//! Access code repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use tomblr_core::result::AppResult;
use tomblr_core::types::{AccessCodeId, UserId};
use tomblr_entity::access_code::{AccessCode, CreateAccessCode};

use super::db_err;
use crate::store::AccessCodeStore;

/// Repository for invitation codes.
#[derive(Debug, Clone)]
pub struct AccessCodeRepository {
    pool: PgPool,
}

impl AccessCodeRepository {
    /// Create a new access code repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessCodeStore for AccessCodeRepository {
    async fn insert_many(&self, codes: &[CreateAccessCode]) -> AppResult<Vec<AccessCode>> {
        let mut inserted = Vec::with_capacity(codes.len());
        for code in codes {
            let row = sqlx::query_as::<_, AccessCode>(
                "INSERT INTO access_codes (id, code, expires_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (code) DO NOTHING RETURNING *",
            )
            .bind(AccessCodeId::new())
            .bind(&code.code)
            .bind(code.expires_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to insert access code"))?;
            inserted.extend(row);
        }
        Ok(inserted)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<AccessCode>> {
        sqlx::query_as::<_, AccessCode>("SELECT * FROM access_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find access code"))
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AccessCode>> {
        sqlx::query_as::<_, AccessCode>(
            "SELECT * FROM access_codes ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list access codes"))
    }

    async fn consume(&self, code: &str, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE access_codes SET is_used = TRUE, used_by = $2 \
             WHERE code = $1 AND NOT is_used AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(code)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to consume access code"))?;
        Ok(result.rows_affected() > 0)
    }
}
