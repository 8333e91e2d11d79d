//! Subscription tiers and their storage limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const GIB: i64 = 1024 * 1024 * 1024;

/// Subscription level that determines a user's storage limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_tier", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionTier {
    /// Default tier for new accounts.
    Free,
    /// Paid individual tier.
    Pro,
    /// Paid team tier.
    Business,
}

impl SubscriptionTier {
    /// Storage limit in bytes granted by this tier.
    pub fn storage_limit_bytes(&self) -> i64 {
        match self {
            Self::Free => 5 * GIB,
            Self::Pro => 500 * GIB,
            Self::Business => 5 * 1024 * GIB,
        }
    }

    /// Return the tier as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Pro => "PRO",
            Self::Business => "BUSINESS",
        }
    }
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Free
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = tomblr_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FREE" => Ok(Self::Free),
            "PRO" => Ok(Self::Pro),
            "BUSINESS" => Ok(Self::Business),
            _ => Err(tomblr_core::AppError::validation(format!(
                "Invalid tier: '{s}'. Expected one of: FREE, PRO, BUSINESS"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_table() {
        assert_eq!(SubscriptionTier::Free.storage_limit_bytes(), 5_368_709_120);
        assert_eq!(SubscriptionTier::Pro.storage_limit_bytes(), 536_870_912_000);
        assert_eq!(
            SubscriptionTier::Business.storage_limit_bytes(),
            5_497_558_138_880
        );
    }

    #[test]
    fn test_default_is_free() {
        assert_eq!(SubscriptionTier::default(), SubscriptionTier::Free);
    }
}
