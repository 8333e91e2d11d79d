//! Request context carrying the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tomblr_core::error::AppError;
use tomblr_core::types::UserId;
use tomblr_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Built once by the API extractor from the bearer token and passed into
/// service methods so that every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            request_time: Utc::now(),
        }
    }

    /// Admin principal for operator tooling that runs outside a request,
    /// such as the admin CLI.
    pub fn system() -> Self {
        Self::new(UserId::from_uuid(uuid::Uuid::nil()), UserRole::Admin)
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fails with `Forbidden` unless the current user is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin access required"))
        }
    }
}
