//! Local cache of last-known values
//!
//! The fusion engine writes every fresh adapter result here and reads it
//! back only when that same adapter fails. Each record is stored as JSON under
//! its own key, plus a few plain-string display entries that other screens
//! read without running a scan.

use crate::fusion::adapters::{GeocodeResult, SoilGridReading, WeatherReading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mitti_common::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

pub const LOCATION_NAME_KEY: &str = "location_name";
pub const WEATHER_SUMMARY_KEY: &str = "weather_summary";
pub const SOIL_MOISTURE_KEY: &str = "soil_moisture";

/// One cached value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub written_at: DateTime<Utc>,
}

/// Durable key-value store; concurrent writes to one key are serialized
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or overwrite
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Insert or overwrite several keys atomically
    async fn put_many(&self, entries: &[(&str, String)]) -> Result<()>;
}

/// Adapter result that can be cached and recovered
pub trait CacheRecord: Serialize + DeserializeOwned + Send + Sync {
    const CACHE_KEY: &'static str;

    /// Plain-string entries written alongside the record
    fn display_entries(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl CacheRecord for GeocodeResult {
    const CACHE_KEY: &'static str = "geocode";

    fn display_entries(&self) -> Vec<(&'static str, String)> {
        vec![(LOCATION_NAME_KEY, self.place_name.clone())]
    }
}

impl CacheRecord for WeatherReading {
    const CACHE_KEY: &'static str = "environment";

    fn display_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![(WEATHER_SUMMARY_KEY, self.summary())];
        if let Some(moisture) = self.soil_moisture {
            entries.push((SOIL_MOISTURE_KEY, format!("{:.2}", moisture)));
        }
        entries
    }
}

impl CacheRecord for SoilGridReading {
    const CACHE_KEY: &'static str = "soil_grid";
}

/// Write a record and its display entries in one transaction
///
/// Concurrent scans never leave the record from one scan next to display
/// entries from another.
pub async fn store_record<R: CacheRecord>(cache: &dyn CacheStore, record: &R) -> Result<()> {
    let json = serde_json::to_string(record)
        .map_err(|e| mitti_common::Error::Internal(format!("Serialize {} failed: {}", R::CACHE_KEY, e)))?;

    let mut entries = vec![(R::CACHE_KEY, json)];
    entries.extend(record.display_entries());
    cache.put_many(&entries).await
}

/// Read a record back
///
/// Read failures and undecodable entries count as a miss.
pub async fn load_record<R: CacheRecord>(cache: &dyn CacheStore) -> Option<R> {
    let entry = match cache.get(R::CACHE_KEY).await {
        Ok(entry) => entry?,
        Err(e) => {
            warn!(key = R::CACHE_KEY, error = %e, "Cache read failed, treating as missing");
            return None;
        }
    };

    match serde_json::from_str(&entry.value) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(key = R::CACHE_KEY, error = %e, "Cached value undecodable, treating as missing");
            None
        }
    }
}

/// Last-known display values for screens that do not run a scan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LastKnown {
    pub location_name: Option<String>,
    pub weather_summary: Option<String>,
    pub soil_moisture: Option<String>,
}

pub async fn last_known(cache: &dyn CacheStore) -> Result<LastKnown> {
    let value = |entry: Option<CacheEntry>| entry.map(|e| e.value);

    Ok(LastKnown {
        location_name: value(cache.get(LOCATION_NAME_KEY).await?),
        weather_summary: value(cache.get(WEATHER_SUMMARY_KEY).await?),
        soil_moisture: value(cache.get(SOIL_MOISTURE_KEY).await?),
    })
}
