//! In-process metadata store.
//!
//! Mirrors the constraints of the PostgreSQL schema (unique email, phone,
//! storage key and share token; cascading folder deletes; guarded storage
//! charges) so services behave identically against either backend. Used by
//! the test suites and for running the API without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use tomblr_core::error::AppError;
use tomblr_core::result::AppResult;
use tomblr_core::types::{AccessCodeId, FileId, FolderId, UserId};
use tomblr_entity::access_code::{AccessCode, CreateAccessCode};
use tomblr_entity::file::{CreateFile, File};
use tomblr_entity::folder::{CreateFolder, Folder};
use tomblr_entity::user::{CreateUser, SubscriptionTier, User, UserRole, UserSummary};

use crate::store::{AccessCodeStore, FileStore, FolderStore, RemovedSubtree, UserStore};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    files: HashMap<FileId, File>,
    folders: HashMap<FolderId, Folder>,
    codes: Vec<AccessCode>,
}

impl State {
    /// `root` and every folder beneath it.
    fn subtree(&self, root: FolderId) -> Vec<FolderId> {
        let mut out = vec![root];
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            for folder in self.folders.values() {
                if folder.parent_id == Some(current) {
                    out.push(folder.id);
                    stack.push(folder.id);
                }
            }
        }
        out
    }
}

/// Metadata store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_file_creates: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `FileStore::create` fail as if the database were down.
    pub fn fail_file_creates(&self, fail: bool) {
        self.fail_file_creates.store(fail, Ordering::SeqCst);
    }

    /// Overwrite a user's counters directly, bypassing the guard.
    pub async fn set_storage(&self, id: UserId, used: i64, limit: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.storage_used = used;
        user.storage_limit = limit;
        Ok(())
    }

    /// Total size of the files a user currently owns.
    pub async fn sum_file_sizes(&self, user_id: UserId) -> i64 {
        let state = self.state.read().await;
        state
            .files
            .values()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.size)
            .sum()
    }
}

fn display_order<T>(items: &mut [T], key: impl Fn(&T) -> (i32, chrono::DateTime<Utc>, uuid::Uuid)) {
    items.sort_by_key(|item| key(item));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        let duplicate = state.users.values().any(|u| {
            u.email.eq_ignore_ascii_case(&data.email)
                || (data.phone_number.is_some() && u.phone_number == data.phone_number)
        });
        if duplicate {
            return Err(AppError::conflict("Email or phone number already in use"));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: data.name.clone(),
            email: data.email.clone(),
            company: data.company.clone(),
            phone_number: data.phone_number.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            tier: data.tier,
            storage_used: 0,
            storage_limit: data.tier.storage_limit_bytes(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.users.remove(&id).is_some();
        if removed {
            state.files.retain(|_, f| f.user_id != id);
            state.folders.retain(|_, f| f.user_id != id);
        }
        Ok(removed)
    }

    async fn list_summaries(&self) -> AppResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<UserSummary> = state
            .users
            .values()
            .map(|u| UserSummary {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                role: u.role,
                tier: u.tier,
                storage_used: u.storage_used,
                file_count: state.files.values().filter(|f| f.user_id == u.id).count() as i64,
                created_at: u.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(match state.users.get_mut(&id) {
            Some(user) => {
                user.role = role;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_tier(
        &self,
        id: UserId,
        tier: SubscriptionTier,
        limit: i64,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(match state.users.get_mut(&id) {
            Some(user) => {
                user.tier = tier;
                user.storage_limit = limit;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn try_charge_storage(&self, id: UserId, bytes: i64) -> AppResult<Option<i64>> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        let next = user.storage_used.saturating_add(bytes);
        if next > user.storage_limit {
            return Ok(None);
        }
        user.storage_used = next;
        Ok(Some(next))
    }

    async fn release_storage(&self, id: UserId, bytes: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.storage_used = (user.storage_used - bytes).max(0);
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.read().await.users.len() as i64)
    }

    async fn total_storage_used(&self) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.users.values().map(|u| u.storage_used).sum())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn create(&self, data: &CreateFile) -> AppResult<File> {
        if self.fail_file_creates.load(Ordering::SeqCst) {
            return Err(AppError::database("Failed to create file: metadata store unavailable"));
        }

        let mut state = self.state.write().await;
        if state.files.values().any(|f| f.storage_key == data.storage_key) {
            return Err(AppError::conflict("Storage key already in use"));
        }
        if let Some(folder_id) = data.folder_id {
            if !state.folders.contains_key(&folder_id) {
                return Err(AppError::not_found("Folder not found"));
            }
        }

        let now = Utc::now();
        let file = File {
            id: FileId::new(),
            name: data.name.clone(),
            size: data.size,
            mime_type: data.mime_type.clone(),
            storage_key: data.storage_key.clone(),
            user_id: data.user_id,
            folder_id: data.folder_id,
            is_public: false,
            share_token: None,
            order: 0,
            created_at: now,
            updated_at: now,
        };
        state.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find_owned(&self, id: FileId, user_id: UserId) -> AppResult<Option<File>> {
        let state = self.state.read().await;
        Ok(state.files.get(&id).filter(|f| f.user_id == user_id).cloned())
    }

    async fn find_by_share_token(&self, token: &str) -> AppResult<Option<File>> {
        let state = self.state.read().await;
        Ok(state
            .files
            .values()
            .find(|f| f.is_public && f.share_token.as_deref() == Some(token))
            .cloned())
    }

    async fn list_children(
        &self,
        user_id: UserId,
        folder_id: Option<FolderId>,
    ) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        let mut files: Vec<File> = state
            .files
            .values()
            .filter(|f| f.user_id == user_id && f.folder_id == folder_id)
            .cloned()
            .collect();
        display_order(&mut files, |f| (f.order, f.created_at, f.id.into_uuid()));
        Ok(files)
    }

    async fn list_in_folders(
        &self,
        user_id: UserId,
        folder_ids: &[FolderId],
    ) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        Ok(state
            .files
            .values()
            .filter(|f| {
                f.user_id == user_id && f.folder_id.is_some_and(|id| folder_ids.contains(&id))
            })
            .cloned()
            .collect())
    }

    async fn delete_owned(&self, id: FileId, user_id: UserId) -> AppResult<Option<File>> {
        let mut state = self.state.write().await;
        if state.files.get(&id).is_some_and(|f| f.user_id == user_id) {
            return Ok(state.files.remove(&id));
        }
        Ok(None)
    }

    async fn set_share_token(
        &self,
        id: FileId,
        user_id: UserId,
        token: Option<&str>,
    ) -> AppResult<Option<File>> {
        let mut state = self.state.write().await;
        if let Some(token) = token {
            if state
                .files
                .values()
                .any(|f| f.id != id && f.share_token.as_deref() == Some(token))
            {
                return Err(AppError::conflict("Share token already in use"));
            }
        }
        let Some(file) = state.files.get_mut(&id).filter(|f| f.user_id == user_id) else {
            return Ok(None);
        };
        file.share_token = token.map(str::to_string);
        file.is_public = token.is_some();
        file.updated_at = Utc::now();
        Ok(Some(file.clone()))
    }

    async fn update_order(&self, id: FileId, user_id: UserId, order: i32) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(match state.files.get_mut(&id).filter(|f| f.user_id == user_id) {
            Some(file) => {
                file.order = order;
                true
            }
            None => false,
        })
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.read().await.files.len() as i64)
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        if let Some(parent) = data.parent_id {
            if !state.folders.contains_key(&parent) {
                return Err(AppError::not_found("Parent folder not found"));
            }
        }

        let now = Utc::now();
        let folder = Folder {
            id: FolderId::new(),
            name: data.name.clone(),
            color: data.color.clone(),
            user_id: data.user_id,
            parent_id: data.parent_id,
            order: 0,
            created_at: now,
            updated_at: now,
        };
        state.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn find_owned(&self, id: FolderId, user_id: UserId) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state.folders.get(&id).filter(|f| f.user_id == user_id).cloned())
    }

    async fn list_children(
        &self,
        user_id: UserId,
        parent_id: Option<FolderId>,
    ) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut folders: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.user_id == user_id && f.parent_id == parent_id)
            .cloned()
            .collect();
        display_order(&mut folders, |f| (f.order, f.created_at, f.id.into_uuid()));
        Ok(folders)
    }

    async fn list_all(&self, user_id: UserId) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_subtree(
        &self,
        id: FolderId,
        user_id: UserId,
    ) -> AppResult<Option<RemovedSubtree>> {
        let mut state = self.state.write().await;
        if !state.folders.get(&id).is_some_and(|f| f.user_id == user_id) {
            return Ok(None);
        }
        let folders = state.subtree(id);
        let doomed: Vec<FileId> = state
            .files
            .values()
            .filter(|f| f.folder_id.is_some_and(|fid| folders.contains(&fid)))
            .map(|f| f.id)
            .collect();
        let files = doomed
            .into_iter()
            .filter_map(|file_id| state.files.remove(&file_id))
            .collect();
        for folder_id in &folders {
            state.folders.remove(folder_id);
        }
        Ok(Some(RemovedSubtree { folders, files }))
    }

    async fn update_order(&self, id: FolderId, user_id: UserId, order: i32) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(match state.folders.get_mut(&id).filter(|f| f.user_id == user_id) {
            Some(folder) => {
                folder.order = order;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl AccessCodeStore for MemoryStore {
    async fn insert_many(&self, codes: &[CreateAccessCode]) -> AppResult<Vec<AccessCode>> {
        let mut state = self.state.write().await;
        let mut inserted = Vec::with_capacity(codes.len());
        for data in codes {
            if state.codes.iter().any(|c| c.code == data.code) {
                continue;
            }
            let code = AccessCode {
                id: AccessCodeId::new(),
                code: data.code.clone(),
                is_used: false,
                used_by: None,
                expires_at: data.expires_at,
                created_at: Utc::now(),
            };
            state.codes.push(code.clone());
            inserted.push(code);
        }
        Ok(inserted)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<AccessCode>> {
        let state = self.state.read().await;
        Ok(state.codes.iter().find(|c| c.code == code).cloned())
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AccessCode>> {
        let state = self.state.read().await;
        let mut codes = state.codes.clone();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        codes.truncate(limit.max(0) as usize);
        Ok(codes)
    }

    async fn consume(&self, code: &str, user_id: UserId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        match state
            .codes
            .iter_mut()
            .find(|c| c.code == code && !c.is_used && !c.is_expired_at(now))
        {
            Some(entry) => {
                entry.is_used = true;
                entry.used_by = Some(user_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
