//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tomblr_core::types::UserId;

use super::role::UserRole;
use super::tier::SubscriptionTier;

/// A registered Tomblr account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email (unique).
    pub email: String,
    /// Optional company name.
    pub company: Option<String>,
    /// Optional phone number (unique when present).
    pub phone_number: Option<String>,
    /// Argon2 hash of the PIN. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role.
    pub role: UserRole,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Bytes currently charged to this user.
    pub storage_used: i64,
    /// Byte limit derived from the tier.
    pub storage_limit: i64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Bytes still available before the limit is reached.
    pub fn remaining_bytes(&self) -> i64 {
        (self.storage_limit - self.storage_used).max(0)
    }

    /// Whether charging `size` more bytes would cross the limit.
    pub fn would_exceed(&self, size: i64) -> bool {
        self.storage_used.saturating_add(size) > self.storage_limit
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Company name.
    pub company: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Pre-hashed PIN.
    pub password_hash: String,
    /// Role.
    pub role: UserRole,
    /// Tier; the storage limit is derived from it.
    pub tier: SubscriptionTier,
}

/// A user row as listed on the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role.
    pub role: UserRole,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Bytes in use.
    pub storage_used: i64,
    /// Number of files owned.
    pub file_count: i64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(used: i64, limit: i64) -> User {
        User {
            id: UserId::new(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            company: None,
            phone_number: None,
            password_hash: String::new(),
            role: UserRole::User,
            tier: SubscriptionTier::Free,
            storage_used: used,
            storage_limit: limit,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_would_exceed_is_strict() {
        let u = user(9, 10);
        assert!(!u.would_exceed(1));
        assert!(u.would_exceed(2));
        assert_eq!(u.remaining_bytes(), 1);
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let mut u = user(0, 10);
        u.password_hash = "secret-hash".into();
        let json = serde_json::to_string(&u).expect("serialize");
        assert!(!json.contains("secret-hash"));
    }
}
