//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::types::UserId;
use tomblr_entity::user::{CreateUser, SubscriptionTier, User, UserRole, UserSummary};

use super::db_err;
use crate::store::UserStore;

/// Repository for users and their storage counters.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users \
                (id, name, email, company, phone_number, password_hash, role, tier, storage_limit) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(UserId::new())
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.company)
        .bind(&data.phone_number)
        .bind(&data.password_hash)
        .bind(data.role)
        .bind(data.tier)
        .bind(data.tier.storage_limit_bytes())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::conflict("Email or phone number already in use")
            }
            _ => db_err("Failed to create user")(e),
        })
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find user"))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find user by email"))
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete user"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_summaries(&self) -> AppResult<Vec<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.email, u.role, u.tier, u.storage_used, u.created_at, \
                    COUNT(f.id) AS file_count \
             FROM users u LEFT JOIN files f ON f.user_id = u.id \
             GROUP BY u.id \
             ORDER BY u.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list users"))
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to update role"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_tier(
        &self,
        id: UserId,
        tier: SubscriptionTier,
        limit: i64,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET tier = $2, storage_limit = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(tier)
        .bind(limit)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to update tier"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn try_charge_storage(&self, id: UserId, bytes: i64) -> AppResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE users SET storage_used = storage_used + $2, updated_at = NOW() \
             WHERE id = $1 AND storage_used + $2 <= storage_limit \
             RETURNING storage_used",
        )
        .bind(id)
        .bind(bytes)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to charge storage"))
    }

    async fn release_storage(&self, id: UserId, bytes: i64) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET storage_used = GREATEST(storage_used - $2, 0), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(bytes)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to release storage"))?;
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count users"))
    }

    async fn total_storage_used(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(storage_used), 0)::BIGINT FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to sum storage"))
    }
}
