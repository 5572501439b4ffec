//! Soil analysis repository
//!
//! Append-only history of fused reports. Each row stores the full report as
//! JSON plus the columns needed for ordering and listing. Every query is a
//! fresh statement; nothing holds a cursor between calls.

use crate::models::SoilReport;
use crate::utils::retry_on_lock;
use async_trait::async_trait;
use mitti_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// Durable storage of finished reports
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persist a report and return its assigned id
    async fn insert(&self, report: &SoilReport) -> Result<i64>;

    async fn get_by_id(&self, id: i64) -> Result<Option<SoilReport>>;

    /// Most recent report by capture time
    async fn get_latest(&self) -> Result<Option<SoilReport>>;

    /// Every report, most recent first
    async fn get_all(&self) -> Result<Vec<SoilReport>>;

    /// Remove one report; false if no such id
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Remove every report; returns the number removed
    async fn clear_all(&self) -> Result<u64>;

    async fn count(&self) -> Result<i64>;
}

/// SQLite-backed [`AnalysisStore`] over the `soil_analyses` table
#[derive(Clone)]
pub struct SqliteAnalysisRepository {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteAnalysisRepository {
    pub fn new(pool: SqlitePool, max_lock_wait_ms: u64) -> Self {
        Self {
            pool,
            max_lock_wait_ms,
        }
    }
}

fn decode_report(row: &sqlx::sqlite::SqliteRow) -> Result<SoilReport> {
    let id: i64 = row.get("analysis_id");
    let json: String = row.get("report_json");

    let report: SoilReport = serde_json::from_str(&json)
        .map_err(|e| Error::Internal(format!("Corrupt report {}: {}", id, e)))?;

    Ok(report.with_id(id))
}

#[async_trait]
impl AnalysisStore for SqliteAnalysisRepository {
    async fn insert(&self, report: &SoilReport) -> Result<i64> {
        // The stored JSON never carries an id; the row id is authoritative
        let mut stored = report.clone();
        stored.id = None;
        let json = serde_json::to_string(&stored)
            .map_err(|e| Error::Internal(format!("Serialize report failed: {}", e)))?;
        let captured_at_ms = report.captured_at.timestamp_millis();
        let soil_type = report.detected_soil_type.as_str();

        let id = retry_on_lock("insert soil analysis", self.max_lock_wait_ms, || {
            let json = json.clone();
            async move {
                let result = sqlx::query(
                    r#"
                    INSERT INTO soil_analyses (captured_at_ms, soil_type, report_json)
                    VALUES (?, ?, ?)
                    "#,
                )
                .bind(captured_at_ms)
                .bind(soil_type)
                .bind(json)
                .execute(&self.pool)
                .await?;

                Ok::<_, Error>(result.last_insert_rowid())
            }
        })
        .await?;

        debug!(analysis_id = id, soil_type, "Soil analysis stored");
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SoilReport>> {
        let row = sqlx::query(
            "SELECT analysis_id, report_json FROM soil_analyses WHERE analysis_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_report).transpose()
    }

    async fn get_latest(&self) -> Result<Option<SoilReport>> {
        let row = sqlx::query(
            r#"
            SELECT analysis_id, report_json FROM soil_analyses
            ORDER BY captured_at_ms DESC, analysis_id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_report).transpose()
    }

    async fn get_all(&self) -> Result<Vec<SoilReport>> {
        let rows = sqlx::query(
            r#"
            SELECT analysis_id, report_json FROM soil_analyses
            ORDER BY captured_at_ms DESC, analysis_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_report).collect()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = retry_on_lock("delete soil analysis", self.max_lock_wait_ms, || async {
            let result = sqlx::query("DELETE FROM soil_analyses WHERE analysis_id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok::<_, Error>(result.rows_affected())
        })
        .await?;

        if affected > 0 {
            info!(analysis_id = id, "Soil analysis deleted");
        }
        Ok(affected > 0)
    }

    async fn clear_all(&self) -> Result<u64> {
        let affected = retry_on_lock("clear soil analyses", self.max_lock_wait_ms, || async {
            let result = sqlx::query("DELETE FROM soil_analyses")
                .execute(&self.pool)
                .await?;
            Ok::<_, Error>(result.rows_affected())
        })
        .await?;

        info!(removed = affected, "All soil analyses cleared");
        Ok(affected)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM soil_analyses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
