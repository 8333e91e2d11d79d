//! PostgreSQL connection pool for the metadata store.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use tomblr_core::config::DatabaseConfig;
use tomblr_core::error::{AppError, ErrorKind};

/// Pool backing the Postgres repositories.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by `config`. Fails with
    /// `PersistenceUnavailable` when the server cannot be reached.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options: PgConnectOptions = config.url.parse().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid database.url", e)
        })?;
        let target = describe_target(&options);
        info!(
            target = %target,
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Opening metadata store pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::PersistenceUnavailable,
                    format!("Metadata store at {target} is unreachable"),
                    e,
                )
            })?;

        info!(target = %target, "Metadata store pool ready");
        Ok(Self { pool })
    }

    /// The sqlx pool the repositories are built on.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every connection; in-flight queries finish first.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Metadata store pool closed");
    }
}

/// `user@host:port/database`, never the password.
fn describe_target(options: &PgConnectOptions) -> String {
    format!(
        "{}@{}:{}/{}",
        options.get_username(),
        options.get_host(),
        options.get_port(),
        options.get_database().unwrap_or("-")
    )
}
