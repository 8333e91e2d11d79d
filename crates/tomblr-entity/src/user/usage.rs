//! Storage usage value object.

use serde::{Deserialize, Serialize};

use super::model::User;
use super::tier::SubscriptionTier;

/// A user's consumption against their limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Bytes in use.
    pub used: i64,
    /// Byte limit.
    pub limit: i64,
    /// `used / limit` as a rounded percentage.
    pub percentage: i64,
    /// Tier the limit comes from.
    pub tier: SubscriptionTier,
}

impl StorageUsage {
    /// Compute usage for a user.
    pub fn of(user: &User) -> Self {
        let percentage = if user.storage_limit <= 0 {
            0
        } else {
            ((user.storage_used as f64 / user.storage_limit as f64) * 100.0).round() as i64
        };

        Self {
            used: user.storage_used,
            limit: user.storage_limit,
            percentage,
            tier: user.tier,
        }
    }
}
