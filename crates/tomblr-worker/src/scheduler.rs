//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use tomblr_core::config::WorkerConfig;
use tomblr_core::error::AppError;

use crate::jobs::cleanup::UploadCleanupJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Abandoned upload sweep
    cleanup: Arc<UploadCleanupJob>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(cleanup: UploadCleanupJob) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            cleanup: Arc::new(cleanup),
        })
    }

    /// Register all default scheduled tasks
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register_upload_cleanup(&config.upload_cleanup_cron)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Start, then shut down once the cancel signal flips to `true`
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) -> Result<(), AppError> {
        self.start().await?;
        while !*cancel.borrow() {
            if cancel.changed().await.is_err() {
                break;
            }
        }
        tracing::info!("Scheduler received shutdown signal");
        self.shutdown().await
    }

    /// Abandoned upload sweep on `schedule`
    async fn register_upload_cleanup(&self, schedule: &str) -> Result<(), AppError> {
        let cleanup = Arc::clone(&self.cleanup);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let cleanup = Arc::clone(&cleanup);
            Box::pin(async move {
                if let Err(e) = cleanup.run().await {
                    tracing::error!(error = %e, "Abandoned upload cleanup failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid upload cleanup schedule '{schedule}': {e}"
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add upload_cleanup schedule: {e}"))
        })?;

        tracing::info!(schedule, "Registered: upload_cleanup");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tomblr_core::config::UploadConfig;
    use tomblr_core::error::ErrorKind;
    use tomblr_database::MemoryStore;
    use tomblr_service::{BlobCommitter, ChunkAssembler, QuotaLedger, UploadService};
    use tomblr_storage::{ChunkStaging, MemoryObjectStore};

    fn cleanup_job(dir: &std::path::Path) -> UploadCleanupJob {
        let metadata = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::default());
        let staging = ChunkStaging::new(dir);
        let quota = QuotaLedger::new(metadata.clone());
        let committer = BlobCommitter::new(metadata.clone(), objects.clone(), quota.clone());
        let assembler = ChunkAssembler::new(
            staging.clone(),
            committer.clone(),
            metadata.clone(),
            UploadConfig::default(),
        );
        let uploads = UploadService::new(
            committer,
            metadata,
            objects,
            staging,
            quota,
            UploadConfig::default(),
        );
        UploadCleanupJob::new(assembler, uploads)
    }

    #[tokio::test]
    async fn test_rejects_bad_cron_expression() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = CronScheduler::new(cleanup_job(dir.path())).await.unwrap();
        let config = WorkerConfig {
            enabled: true,
            upload_cleanup_cron: "every now and then".into(),
        };
        let err = scheduler.register_default_tasks(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = CronScheduler::new(cleanup_job(dir.path())).await.unwrap();
        scheduler
            .register_default_tasks(&WorkerConfig::default())
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }
}
