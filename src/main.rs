//! Tomblr server
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use tomblr_api::{AppState, Backends};
use tomblr_core::config::AppConfig;
use tomblr_core::error::AppError;
use tomblr_core::traits::ObjectStore;
use tomblr_database::DatabasePool;
use tomblr_database::repositories::{
    AccessCodeRepository, FileRepository, FolderRepository, UserRepository,
};
use tomblr_storage::{ChunkStaging, S3ObjectStore};
use tomblr_worker::{CronScheduler, UploadCleanupJob};

#[tokio::main]
async fn main() {
    let env = std::env::var("TOMBLR_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Tomblr v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;
    tomblr_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Object storage ───────────────────────────────────
    let objects = S3ObjectStore::new(&config.storage).await?;
    objects.ensure_bucket().await?;
    tracing::info!(bucket = %config.storage.bucket, "Object storage ready");

    // ── Step 3: Chunk staging area ───────────────────────────────
    let staging = ChunkStaging::new(&config.storage.staging_root);
    staging.init().await?;

    // ── Step 4: Repositories and services ────────────────────────
    let backends = Backends {
        users: Arc::new(UserRepository::new(db.pool().clone())),
        files: Arc::new(FileRepository::new(db.pool().clone())),
        folders: Arc::new(FolderRepository::new(db.pool().clone())),
        codes: Arc::new(AccessCodeRepository::new(db.pool().clone())),
        objects: Arc::new(objects),
        staging,
    };
    let state = AppState::build(config.clone(), backends);
    tracing::info!("Services initialized");

    // ── Step 5: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 6: Start background worker ──────────────────────────
    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting background worker...");
        let cleanup = UploadCleanupJob::new(
            (*state.chunk_assembler).clone(),
            (*state.upload_service).clone(),
        );
        let scheduler = CronScheduler::new(cleanup).await?;
        scheduler.register_default_tasks(&config.worker).await?;

        let handle = tokio::spawn(async move {
            if let Err(e) = scheduler.run(shutdown_rx).await {
                tracing::error!("Scheduler error: {e}");
            }
        });
        Some(handle)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 7: Build and start HTTP server ──────────────────────
    let app = tomblr_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Tomblr server listening on {addr}");

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    if let Some(handle) = worker_handle {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Background worker did not stop within the grace period");
        }
    }

    db.close().await;
    tracing::info!("Tomblr server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
