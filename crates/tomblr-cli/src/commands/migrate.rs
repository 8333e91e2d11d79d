//! Database migration command.

use tomblr_core::error::AppError;
use tomblr_database::DatabasePool;

use crate::output;

/// Run all pending migrations
pub async fn execute(pool: &DatabasePool) -> Result<(), AppError> {
    println!("Running database migrations...");
    tomblr_database::migration::run_migrations(pool.pool()).await?;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
