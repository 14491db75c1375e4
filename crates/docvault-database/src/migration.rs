//! Database migration runner.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use docvault_core::error::{AppError, ErrorKind};

/// One applied migration, as recorded by sqlx.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedMigration {
    /// Migration version number.
    pub version: i64,
    /// Migration description.
    pub description: String,
    /// When the migration was applied.
    pub installed_on: DateTime<Utc>,
}

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// List migrations that have been applied to the database.
pub async fn applied_migrations(pool: &PgPool) -> Result<Vec<AppliedMigration>, AppError> {
    sqlx::query_as::<_, AppliedMigration>(
        "SELECT version, description, installed_on FROM _sqlx_migrations ORDER BY version ASC",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list migrations", e))
}

/// Drop everything in the public schema and re-run all migrations.
pub async fn reset_database(pool: &PgPool) -> Result<(), AppError> {
    info!("Resetting database schema...");

    sqlx::query("DROP SCHEMA public CASCADE")
        .execute(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to drop schema", e))?;
    sqlx::query("CREATE SCHEMA public")
        .execute(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to recreate schema", e))?;

    run_migrations(pool).await
}
