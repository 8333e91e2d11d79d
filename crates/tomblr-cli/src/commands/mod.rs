//! CLI command definitions and dispatch.

pub mod admin;
pub mod codes;
pub mod migrate;
pub mod users;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use tomblr_auth::jwt::JwtEncoder;
use tomblr_auth::password::PasswordHasher;
use tomblr_core::config::AppConfig;
use tomblr_core::error::AppError;
use tomblr_database::DatabasePool;
use tomblr_database::repositories::{AccessCodeRepository, FileRepository, UserRepository};
use tomblr_service::{AccessCodeService, AccountService, AdminService};

use crate::output::OutputFormat;

/// Tomblr admin tooling
#[derive(Debug, Parser)]
#[command(name = "tomblr", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (`config/{env}.toml` over `config/default.toml`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Admin account management
    Admin(admin::AdminArgs),
    /// Invitation codes
    Codes(codes::CodesArgs),
    /// User management
    Users(users::UsersArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.env)?;
        let pool = DatabasePool::connect(&config.database).await?;

        let result = match &self.command {
            Commands::Migrate => migrate::execute(&pool).await,
            Commands::Admin(args) => admin::execute(args, &Toolkit::new(&config, &pool)).await,
            Commands::Codes(args) => {
                codes::execute(args, &Toolkit::new(&config, &pool), self.format).await
            }
            Commands::Users(args) => {
                users::execute(args, &Toolkit::new(&config, &pool), self.format).await
            }
        };

        pool.close().await;
        result
    }
}

/// Helper: prompt errors become internal errors
pub(crate) fn input_error(e: dialoguer::Error) -> AppError {
    AppError::internal(format!("Input error: {e}"))
}

/// Services the admin commands run against.
#[derive(Debug)]
pub struct Toolkit {
    /// Direct user lookups
    pub users: Arc<UserRepository>,
    /// Registration and admin creation
    pub accounts: AccountService,
    /// Invitation codes
    pub access: AccessCodeService,
    /// Stats and user management
    pub admin: AdminService,
}

impl Toolkit {
    /// Wire the services against Postgres.
    pub fn new(config: &AppConfig, pool: &DatabasePool) -> Self {
        let users = Arc::new(UserRepository::new(pool.pool().clone()));
        let files = Arc::new(FileRepository::new(pool.pool().clone()));
        let codes = Arc::new(AccessCodeRepository::new(pool.pool().clone()));

        Self {
            accounts: AccountService::new(
                users.clone(),
                codes.clone(),
                PasswordHasher::new(),
                JwtEncoder::new(&config.auth),
            ),
            access: AccessCodeService::new(codes),
            admin: AdminService::new(users.clone(), files),
            users,
        }
    }
}
