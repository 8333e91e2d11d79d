//! Shared wiring for the service unit tests.

use std::sync::Arc;

use tempfile::TempDir;

use tomblr_auth::jwt::JwtEncoder;
use tomblr_auth::password::PasswordHasher;
use tomblr_core::config::AppConfig;
use tomblr_database::MemoryStore;
use tomblr_database::store::UserStore;
use tomblr_entity::user::{CreateUser, SubscriptionTier, User, UserRole};
use tomblr_storage::{ChunkStaging, MemoryObjectStore};

use crate::context::RequestContext;
use crate::{
    AccessCodeService, AccountService, AdminService, BlobCommitter, ChunkAssembler, FileService,
    FolderService, QuotaLedger, ShareService, UploadService,
};

pub(crate) struct Fixture {
    pub config: AppConfig,
    pub metadata: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub staging: ChunkStaging,
    pub user: User,
    pub quota: QuotaLedger,
    pub committer: BlobCommitter,
    pub assembler: ChunkAssembler,
    pub uploads: UploadService,
    pub files: FileService,
    pub folders: FolderService,
    pub shares: ShareService,
    pub access: AccessCodeService,
    pub accounts: AccountService,
    pub admin: AdminService,
    _dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "unit-test-secret".into();

        let dir = tempfile::tempdir().expect("tempdir");
        let staging = ChunkStaging::new(dir.path());
        let metadata = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::default());

        let quota = QuotaLedger::new(metadata.clone());
        let committer = BlobCommitter::new(metadata.clone(), objects.clone(), quota.clone());
        let assembler = ChunkAssembler::new(
            staging.clone(),
            committer.clone(),
            metadata.clone(),
            config.upload.clone(),
        );
        let uploads = UploadService::new(
            committer.clone(),
            metadata.clone(),
            objects.clone(),
            staging.clone(),
            quota.clone(),
            config.upload.clone(),
        );
        let files = FileService::new(
            metadata.clone(),
            metadata.clone(),
            objects.clone(),
            quota.clone(),
            config.upload.clone(),
        );
        let folders = FolderService::new(
            metadata.clone(),
            metadata.clone(),
            objects.clone(),
            quota.clone(),
        );
        let shares = ShareService::new(
            metadata.clone(),
            objects.clone(),
            &config.share,
            &config.upload,
        );
        let access = AccessCodeService::new(metadata.clone());
        let accounts = AccountService::new(
            metadata.clone(),
            metadata.clone(),
            PasswordHasher::new(),
            JwtEncoder::new(&config.auth),
        );
        let admin = AdminService::new(metadata.clone(), metadata.clone());

        let user = create_user(&metadata, "owner@example.com", UserRole::User).await;

        Self {
            config,
            metadata,
            objects,
            staging,
            user,
            quota,
            committer,
            assembler,
            uploads,
            files,
            folders,
            shares,
            access,
            accounts,
            admin,
            _dir: dir,
        }
    }

    pub fn ctx(&self) -> RequestContext {
        RequestContext::new(self.user.id, self.user.role)
    }

    pub async fn other_user(&self, email: &str) -> User {
        create_user(&self.metadata, email, UserRole::User).await
    }

    pub async fn admin_ctx(&self) -> RequestContext {
        let admin = create_user(&self.metadata, "admin@example.com", UserRole::Admin).await;
        RequestContext::new(admin.id, admin.role)
    }
}

async fn create_user(store: &MemoryStore, email: &str, role: UserRole) -> User {
    UserStore::create(
        store,
        &CreateUser {
            name: "Test User".into(),
            email: email.into(),
            company: None,
            phone_number: None,
            password_hash: "not-a-real-hash".into(),
            role,
            tier: SubscriptionTier::Free,
        },
    )
    .await
    .expect("create user")
}
