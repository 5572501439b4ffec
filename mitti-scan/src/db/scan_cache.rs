//! Last-known value cache
//!
//! One row per key in `scan_cache`, overwritten on every fresh fetch.

use crate::cache::{CacheEntry, CacheStore};
use crate::utils::retry_on_lock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mitti_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// SQLite-backed [`CacheStore`]
#[derive(Clone)]
pub struct SqliteCacheStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteCacheStore {
    pub fn new(pool: SqlitePool, max_lock_wait_ms: u64) -> Self {
        Self {
            pool,
            max_lock_wait_ms,
        }
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query("SELECT key, value, written_at FROM scan_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let written_at: String = row.get("written_at");
                let written_at = DateTime::parse_from_rfc3339(&written_at)
                    .map_err(|e| Error::Internal(format!("Bad cache timestamp for {}: {}", key, e)))?
                    .with_timezone(&Utc);

                Ok(Some(CacheEntry {
                    key: row.get("key"),
                    value: row.get("value"),
                    written_at,
                }))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.put_many(&[(key, value.to_string())]).await
    }

    async fn put_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let written_at = Utc::now().to_rfc3339();

        retry_on_lock("cache write", self.max_lock_wait_ms, || async {
            let mut tx = self.pool.begin().await?;
            for (key, value) in entries {
                sqlx::query(
                    r#"
                    INSERT INTO scan_cache (key, value, written_at) VALUES (?, ?, ?)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        written_at = excluded.written_at
                    "#,
                )
                .bind(*key)
                .bind(value)
                .bind(&written_at)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
            Ok::<_, Error>(())
        })
        .await?;

        tracing::debug!(keys = entries.len(), "Cache entries written");
        Ok(())
    }
}
