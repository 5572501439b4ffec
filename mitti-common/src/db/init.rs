//! Database initialization
//!
//! Opens (or creates) the Mitti SQLite database and creates the tables the
//! scan pipeline needs. Table creation is idempotent and safe on every start.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default SQLite busy timeout before a write reports `database is locked`
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 250;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL allows concurrent readers with one writer. The busy timeout is kept
    // short; longer waits are handled by retry with backoff.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create every table used by the scan pipeline
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_scan_cache_table(pool).await?;
    create_soil_analyses_table(pool).await?;
    Ok(())
}

/// Create the scan cache table
///
/// Last-known value of each fused field, keyed by field name. Rows are
/// overwritten in place; there is no expiry.
pub async fn create_scan_cache_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scan_cache (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            written_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the soil analyses table
///
/// Append-only history of fused soil reports. `captured_at_ms` is the scan
/// capture time (not the insert time) and drives the default ordering.
pub async fn create_soil_analyses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS soil_analyses (
            analysis_id INTEGER PRIMARY KEY AUTOINCREMENT,
            captured_at_ms INTEGER NOT NULL,
            soil_type TEXT NOT NULL,
            report_json TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_soil_analyses_captured ON soil_analyses(captured_at_ms DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
