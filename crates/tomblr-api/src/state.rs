//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use tomblr_auth::jwt::{JwtDecoder, JwtEncoder};
use tomblr_auth::password::PasswordHasher;
use tomblr_core::config::AppConfig;
use tomblr_core::traits::ObjectStore;
use tomblr_database::store::{AccessCodeStore, FileStore, FolderStore, UserStore};
use tomblr_service::{
    AccessCodeService, AccountService, AdminService, BlobCommitter, ChunkAssembler, FileService,
    FolderService, QuotaLedger, ShareService, UploadService,
};
use tomblr_storage::ChunkStaging;

/// The stores a running server is wired against.
///
/// Postgres repositories and an S3 bucket in production; the in-memory
/// backends in tests.
#[derive(Debug, Clone)]
pub struct Backends {
    /// User store
    pub users: Arc<dyn UserStore>,
    /// File store
    pub files: Arc<dyn FileStore>,
    /// Folder store
    pub folders: Arc<dyn FolderStore>,
    /// Access code store
    pub codes: Arc<dyn AccessCodeStore>,
    /// Blob storage
    pub objects: Arc<dyn ObjectStore>,
    /// Chunk staging area
    pub staging: ChunkStaging,
}

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// When the process started
    pub started_at: Instant,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Single-shot uploads and presigned direct uploads
    pub upload_service: Arc<UploadService>,
    /// Resumable chunked uploads
    pub chunk_assembler: Arc<ChunkAssembler>,
    /// File reads, deletes, ordering, usage
    pub file_service: Arc<FileService>,
    /// Folder hierarchy
    pub folder_service: Arc<FolderService>,
    /// Public share links
    pub share_service: Arc<ShareService>,
    /// Invitation codes
    pub access_service: Arc<AccessCodeService>,
    /// Registration and login
    pub account_service: Arc<AccountService>,
    /// Admin dashboard
    pub admin_service: Arc<AdminService>,
}

impl AppState {
    /// Wire every service against `backends`.
    pub fn build(config: AppConfig, backends: Backends) -> Self {
        let Backends {
            users,
            files,
            folders,
            codes,
            objects,
            staging,
        } = backends;

        let quota = QuotaLedger::new(Arc::clone(&users));
        let committer = BlobCommitter::new(Arc::clone(&files), Arc::clone(&objects), quota.clone());

        let chunk_assembler = ChunkAssembler::new(
            staging.clone(),
            committer.clone(),
            Arc::clone(&folders),
            config.upload.clone(),
        );
        let upload_service = UploadService::new(
            committer,
            Arc::clone(&folders),
            Arc::clone(&objects),
            staging,
            quota.clone(),
            config.upload.clone(),
        );
        let file_service = FileService::new(
            Arc::clone(&files),
            Arc::clone(&folders),
            Arc::clone(&objects),
            quota.clone(),
            config.upload.clone(),
        );
        let folder_service = FolderService::new(
            Arc::clone(&folders),
            Arc::clone(&files),
            Arc::clone(&objects),
            quota,
        );
        let share_service = ShareService::new(
            Arc::clone(&files),
            Arc::clone(&objects),
            &config.share,
            &config.upload,
        );
        let access_service = AccessCodeService::new(Arc::clone(&codes));
        let account_service = AccountService::new(
            Arc::clone(&users),
            codes,
            PasswordHasher::new(),
            JwtEncoder::new(&config.auth),
        );
        let admin_service = AdminService::new(users, files);

        Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            config: Arc::new(config),
            started_at: Instant::now(),
            upload_service: Arc::new(upload_service),
            chunk_assembler: Arc::new(chunk_assembler),
            file_service: Arc::new(file_service),
            folder_service: Arc::new(folder_service),
            share_service: Arc::new(share_service),
            access_service: Arc::new(access_service),
            account_service: Arc::new(account_service),
            admin_service: Arc::new(admin_service),
        }
    }
}
