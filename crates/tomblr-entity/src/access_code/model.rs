//! Access code entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tomblr_core::types::{AccessCodeId, UserId};

/// A single-use invitation code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccessCode {
    /// Row identifier.
    pub id: AccessCodeId,
    /// The code itself (unique).
    pub code: String,
    /// Whether the code has been redeemed.
    pub is_used: bool,
    /// Account that redeemed the code.
    pub used_by: Option<UserId>,
    /// Expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the code was created.
    pub created_at: DateTime<Utc>,
}

impl AccessCode {
    /// Whether the code is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Data required to create an access code.
#[derive(Debug, Clone)]
pub struct CreateAccessCode {
    /// The code.
    pub code: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}
