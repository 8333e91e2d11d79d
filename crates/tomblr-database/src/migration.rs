//! Schema migrations embedded from `migrations/`.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use tomblr_core::error::{AppError, ErrorKind};

/// Every migration compiled into the binary.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Bring the schema up to date. Already applied versions are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let latest = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default();
    info!(known = MIGRATOR.iter().count(), latest, "Applying schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::PersistenceUnavailable,
            format!("Schema migration failed: {e}"),
            e,
        )
    })?;

    info!(version = latest, "Schema is current");
    Ok(())
}
