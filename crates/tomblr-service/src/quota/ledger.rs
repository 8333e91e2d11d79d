//! Quota ledger: reserve, commit and release storage against a user's limit.
//!
//! `reserve` is an advisory read taken before any blob is written. The
//! authoritative check is `commit`, a single guarded increment in the
//! metadata store, so two finalizes racing for the last bytes of a quota
//! cannot both succeed.

use std::sync::Arc;

use tracing::{debug, warn};

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::types::UserId;
use tomblr_database::store::UserStore;
use tomblr_entity::user::{StorageUsage, SubscriptionTier, User};

/// Tracks consumed storage for every user.
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    users: Arc<dyn UserStore>,
}

impl QuotaLedger {
    /// Creates a new ledger.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Storage limit for `tier`.
    pub fn limit_for(tier: SubscriptionTier) -> i64 {
        tier.storage_limit_bytes()
    }

    async fn load_user(&self, user_id: UserId) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Fails with `QuotaExceeded` if adding `size` bytes would pass the limit.
    pub async fn reserve(&self, user_id: UserId, size: i64) -> AppResult<()> {
        let user = self.load_user(user_id).await?;
        if user.would_exceed(size) {
            debug!(
                user_id = %user_id,
                size,
                used = user.storage_used,
                limit = user.storage_limit,
                "Quota reservation refused"
            );
            return Err(quota_exceeded(&user, size));
        }
        Ok(())
    }

    /// Atomically charge `size` bytes. Returns the new usage.
    pub async fn commit(&self, user_id: UserId, size: i64) -> AppResult<i64> {
        match self.users.try_charge_storage(user_id, size).await? {
            Some(used) => {
                debug!(user_id = %user_id, size, used, "Quota committed");
                Ok(used)
            }
            None => {
                let user = self.load_user(user_id).await?;
                warn!(user_id = %user_id, size, "Quota commit lost a race for the remaining space");
                Err(quota_exceeded(&user, size))
            }
        }
    }

    /// Atomically give back `size` bytes, flooring usage at zero.
    pub async fn release(&self, user_id: UserId, size: i64) -> AppResult<()> {
        if size <= 0 {
            return Ok(());
        }
        self.users.release_storage(user_id, size).await?;
        debug!(user_id = %user_id, size, "Quota released");
        Ok(())
    }

    /// Current usage snapshot.
    pub async fn usage(&self, user_id: UserId) -> AppResult<StorageUsage> {
        Ok(StorageUsage::of(&self.load_user(user_id).await?))
    }
}

fn quota_exceeded(user: &User, size: i64) -> AppError {
    AppError::quota_exceeded(format!(
        "Storage limit exceeded: {} of {} bytes used, {} more requested",
        user.storage_used, user.storage_limit, size
    ))
}
