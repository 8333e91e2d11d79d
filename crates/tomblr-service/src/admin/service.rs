//! Admin dashboard: aggregate stats and user management.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::types::UserId;
use tomblr_database::store::{FileStore, UserStore};
use tomblr_entity::user::{SubscriptionTier, UserRole, UserSummary};

use crate::context::RequestContext;
use crate::quota::QuotaLedger;

/// System-wide totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    /// Registered users.
    pub total_users: i64,
    /// Stored files.
    pub total_files: i64,
    /// Bytes used across all users.
    pub total_storage_used: i64,
}

/// Admin-only operations. Every method requires the ADMIN role.
#[derive(Debug, Clone)]
pub struct AdminService {
    users: Arc<dyn UserStore>,
    files: Arc<dyn FileStore>,
}

impl AdminService {
    /// Creates a new admin service.
    pub fn new(users: Arc<dyn UserStore>, files: Arc<dyn FileStore>) -> Self {
        Self { users, files }
    }

    /// Totals for the dashboard.
    pub async fn stats(&self, ctx: &RequestContext) -> AppResult<SystemStats> {
        ctx.require_admin()?;
        let (total_users, total_files, total_storage_used) = tokio::try_join!(
            self.users.count(),
            self.files.count(),
            self.users.total_storage_used(),
        )?;
        Ok(SystemStats {
            total_users,
            total_files,
            total_storage_used,
        })
    }

    /// Every user with a file count, newest first.
    pub async fn list_users(&self, ctx: &RequestContext) -> AppResult<Vec<UserSummary>> {
        ctx.require_admin()?;
        self.users.list_summaries().await
    }

    /// Change a user's role.
    pub async fn update_user_role(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        role: UserRole,
    ) -> AppResult<()> {
        ctx.require_admin()?;
        if !self.users.update_role(user_id, role).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!(admin_id = %ctx.user_id, user_id = %user_id, role = %role, "User role updated");
        Ok(())
    }

    /// Change a user's tier and recompute their storage limit.
    pub async fn update_user_tier(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        tier: SubscriptionTier,
    ) -> AppResult<()> {
        ctx.require_admin()?;
        let limit = QuotaLedger::limit_for(tier);
        if !self.users.update_tier(user_id, tier, limit).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!(admin_id = %ctx.user_id, user_id = %user_id, tier = %tier, limit, "User tier updated");
        Ok(())
    }
}
