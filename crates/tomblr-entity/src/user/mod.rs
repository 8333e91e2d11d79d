//! User domain entities.

pub mod model;
pub mod role;
pub mod tier;
pub mod usage;

pub use model::{CreateUser, User, UserSummary};
pub use role::UserRole;
pub use tier::SubscriptionTier;
pub use usage::StorageUsage;
