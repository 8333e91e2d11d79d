//! Metadata store traits consumed by the service layer.
//!
//! Every method is a single atomic mutation or a read. No method spans
//! more than one entity inside a transaction; services compensate
//! explicitly where a multi-step operation fails halfway.

use async_trait::async_trait;

use tomblr_core::result::AppResult;
use tomblr_core::types::{FileId, FolderId, UserId};
use tomblr_entity::access_code::{AccessCode, CreateAccessCode};
use tomblr_entity::file::{CreateFile, File};
use tomblr_entity::folder::{CreateFolder, Folder};
use tomblr_entity::user::{CreateUser, SubscriptionTier, User, UserRole, UserSummary};

/// Rows removed by [`FolderStore::delete_subtree`].
#[derive(Debug, Clone, Default)]
pub struct RemovedSubtree {
    /// Removed folders, the deleted root included.
    pub folders: Vec<FolderId>,
    /// File rows that lived in those folders.
    pub files: Vec<File>,
}

/// Persistence for accounts and their storage counters.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a user. Duplicate email or phone fails with `Conflict`.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by login email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Delete a user. Returns whether a row was removed.
    async fn delete(&self, id: UserId) -> AppResult<bool>;

    /// All users with their file counts, newest first.
    async fn list_summaries(&self) -> AppResult<Vec<UserSummary>>;

    /// Change a user's role. Returns whether the user exists.
    async fn update_role(&self, id: UserId, role: UserRole) -> AppResult<bool>;

    /// Change a user's tier and set `storage_limit` to `limit`.
    async fn update_tier(&self, id: UserId, tier: SubscriptionTier, limit: i64)
    -> AppResult<bool>;

    /// Atomically add `bytes` to `storage_used` if the result stays within
    /// `storage_limit`. Returns the new usage, or `None` when the guard
    /// rejected the increment or the user does not exist.
    async fn try_charge_storage(&self, id: UserId, bytes: i64) -> AppResult<Option<i64>>;

    /// Atomically subtract `bytes` from `storage_used`, flooring at zero.
    async fn release_storage(&self, id: UserId, bytes: i64) -> AppResult<()>;

    /// Number of registered users.
    async fn count(&self) -> AppResult<i64>;

    /// Sum of `storage_used` over all users.
    async fn total_storage_used(&self) -> AppResult<i64>;
}

/// Persistence for file rows.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a file row. A reused storage key fails with `Conflict`.
    async fn create(&self, data: &CreateFile) -> AppResult<File>;

    /// Find a file owned by `user_id`.
    async fn find_owned(&self, id: FileId, user_id: UserId) -> AppResult<Option<File>>;

    /// Find a public file by its current share token.
    async fn find_by_share_token(&self, token: &str) -> AppResult<Option<File>>;

    /// Files directly inside `folder_id` (or at the root when `None`), in
    /// display order.
    async fn list_children(
        &self,
        user_id: UserId,
        folder_id: Option<FolderId>,
    ) -> AppResult<Vec<File>>;

    /// Files whose folder is any of `folder_ids`.
    async fn list_in_folders(
        &self,
        user_id: UserId,
        folder_ids: &[FolderId],
    ) -> AppResult<Vec<File>>;

    /// Delete a file owned by `user_id`, returning the removed row.
    async fn delete_owned(&self, id: FileId, user_id: UserId) -> AppResult<Option<File>>;

    /// Publish a file under `token`, or unpublish it when `token` is `None`.
    async fn set_share_token(
        &self,
        id: FileId,
        user_id: UserId,
        token: Option<&str>,
    ) -> AppResult<Option<File>>;

    /// Set the sort key of a file owned by `user_id`.
    async fn update_order(&self, id: FileId, user_id: UserId, order: i32) -> AppResult<bool>;

    /// Number of files across all users.
    async fn count(&self) -> AppResult<i64>;
}

/// Persistence for folder rows.
#[async_trait]
pub trait FolderStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a folder. A parent that vanished concurrently fails with `NotFound`.
    async fn create(&self, data: &CreateFolder) -> AppResult<Folder>;

    /// Find a folder owned by `user_id`.
    async fn find_owned(&self, id: FolderId, user_id: UserId) -> AppResult<Option<Folder>>;

    /// Subfolders directly inside `parent_id` (or at the root), in display order.
    async fn list_children(
        &self,
        user_id: UserId,
        parent_id: Option<FolderId>,
    ) -> AppResult<Vec<Folder>>;

    /// Every folder the user owns.
    async fn list_all(&self, user_id: UserId) -> AppResult<Vec<Folder>>;

    /// Delete a folder with every subfolder and file beneath it. Returns
    /// everything removed, or `None` when `user_id` does not own the folder.
    ///
    /// Rows added under the subtree while the delete runs are either part of
    /// the returned set or fail to insert; none are removed unreported.
    async fn delete_subtree(&self, id: FolderId, user_id: UserId)
    -> AppResult<Option<RemovedSubtree>>;

    /// Set the sort key of a folder owned by `user_id`.
    async fn update_order(&self, id: FolderId, user_id: UserId, order: i32) -> AppResult<bool>;
}

/// Persistence for invitation codes.
#[async_trait]
pub trait AccessCodeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert codes, skipping any that already exist. Returns the inserted rows.
    async fn insert_many(&self, codes: &[CreateAccessCode]) -> AppResult<Vec<AccessCode>>;

    /// Find a code.
    async fn find_by_code(&self, code: &str) -> AppResult<Option<AccessCode>>;

    /// Most recently created codes, newest first.
    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AccessCode>>;

    /// Mark a code used by `user_id` if it is still unused and unexpired.
    /// Returns whether this call consumed it.
    async fn consume(&self, code: &str, user_id: UserId) -> AppResult<bool>;
}
