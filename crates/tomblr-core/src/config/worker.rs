//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled maintenance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the abandoned upload sweep.
    #[serde(default = "default_upload_cleanup_cron")]
    pub upload_cleanup_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            upload_cleanup_cron: default_upload_cleanup_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_upload_cleanup_cron() -> String {
    "0 0 * * * *".to_string()
}
