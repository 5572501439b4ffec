//! Test Helper Utilities
//!
//! Shared utilities for testing mitti-scan: a temp SQLite database, counting
//! mock data sources and fixture values.

#![allow(dead_code)]

pub mod log_capture;
pub mod onnx_fixture;

pub use log_capture::{capture_logs, LogCapture};
pub use onnx_fixture::{linear_model, one_hot_model, write_model};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use mitti_common::{Error, Result};
use mitti_scan::cache::CacheStore;
use mitti_scan::classifier::SoilClassifier;
use mitti_scan::db::{AnalysisStore, SqliteAnalysisRepository, SqliteCacheStore};
use mitti_scan::error::{ScanError, ScanResult};
use mitti_scan::fusion::adapters::{GeocodeResult, SoilGridReading, SourceAdapter, WeatherReading};
use mitti_scan::fusion::{FusionEngine, ScanSources};
use mitti_scan::models::{
    Coordinates, EnvironmentalSnapshot, Provenance, SoilReport, SoilTypeLabel, Sourced,
};
use mitti_scan::nutrients::NutrientEstimate;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Barrier;

/// Lock retry budget used by test stores
pub const TEST_LOCK_WAIT_MS: u64 = 2000;

/// Create a temporary database with the scan tables
///
/// Returns (TempDir, SqlitePool); the TempDir must outlive the pool.
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("temp dir");
    let pool = mitti_common::db::init_database(&temp_dir.path().join("test_mitti.db"))
        .await
        .expect("init database");
    (temp_dir, pool)
}

pub fn pune() -> Coordinates {
    Coordinates::new(18.5204, 73.8567).unwrap()
}

pub fn geocode_fixture() -> GeocodeResult {
    GeocodeResult {
        place_name: "Pune, Maharashtra".to_string(),
        district: Some("Pune".to_string()),
    }
}

pub fn weather_fixture() -> WeatherReading {
    WeatherReading {
        temperature: 31.4,
        humidity: 64.0,
        precipitation: 0.0,
        soil_moisture: Some(0.27),
        wind_speed: Some(12.0),
        weather_code: Some(1),
    }
}

pub fn soil_grid_fixture() -> SoilGridReading {
    SoilGridReading {
        nitrogen_cg_kg: Some(140.0),
        phh2o_x10: Some(68.0),
        soc: Some(50.0),
        clay_pct: Some(20.0),
    }
}

/// Failure a source reports when the network is unreachable
pub fn network_down<T>() -> Behavior<T> {
    Behavior::Fail(ScanError::Network("connection refused".to_string()))
}

/// What a mock source does when fetched
#[derive(Clone)]
pub enum Behavior<T> {
    Succeed(T),
    Fail(ScanError),
    /// Sleep, then succeed
    Delay(Duration, T),
    /// Wait at the barrier, then succeed
    Rendezvous(Arc<Barrier>, T),
}

/// Counting mock data source
pub struct MockSource<T> {
    id: &'static str,
    behavior: Behavior<T>,
    timeout: Duration,
    calls: AtomicUsize,
    last_coordinates: Mutex<Option<Coordinates>>,
}

impl<T> MockSource<T> {
    pub fn new(id: &'static str, behavior: Behavior<T>) -> Arc<Self> {
        Self::with_timeout(id, behavior, Duration::from_secs(5))
    }

    pub fn with_timeout(id: &'static str, behavior: Behavior<T>, timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            behavior,
            timeout,
            calls: AtomicUsize::new(0),
            last_coordinates: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_coordinates(&self) -> Option<Coordinates> {
        *self.last_coordinates.lock().unwrap()
    }
}

#[async_trait]
impl<T> SourceAdapter for MockSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn source_id(&self) -> &'static str {
        self.id
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, coordinates: Coordinates) -> ScanResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_coordinates.lock().unwrap() = Some(coordinates);

        match &self.behavior {
            Behavior::Succeed(value) => Ok(value.clone()),
            Behavior::Fail(err) => Err(err.clone()),
            Behavior::Delay(delay, value) => {
                tokio::time::sleep(*delay).await;
                Ok(value.clone())
            }
            Behavior::Rendezvous(barrier, value) => {
                barrier.wait().await;
                Ok(value.clone())
            }
        }
    }
}

/// Classifier returning a fixed label
pub struct MockClassifier {
    label: SoilTypeLabel,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(label: SoilTypeLabel) -> Arc<Self> {
        Arc::new(Self {
            label,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SoilClassifier for MockClassifier {
    async fn classify(&self, _image: Bytes) -> SoilTypeLabel {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.label
    }
}

/// Repository whose writes always fail
pub struct FailingRepository;

#[async_trait]
impl AnalysisStore for FailingRepository {
    async fn insert(&self, _report: &SoilReport) -> Result<i64> {
        Err(Error::Internal("disk I/O error".to_string()))
    }

    async fn get_by_id(&self, _id: i64) -> Result<Option<SoilReport>> {
        Ok(None)
    }

    async fn get_latest(&self) -> Result<Option<SoilReport>> {
        Ok(None)
    }

    async fn get_all(&self) -> Result<Vec<SoilReport>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: i64) -> Result<bool> {
        Err(Error::Internal("disk I/O error".to_string()))
    }

    async fn clear_all(&self) -> Result<u64> {
        Err(Error::Internal("disk I/O error".to_string()))
    }

    async fn count(&self) -> Result<i64> {
        Ok(0)
    }
}

/// Engine wired to mock sources and real SQLite stores
pub struct Harness {
    _dir: TempDir,
    pub pool: SqlitePool,
    pub geocoder: Arc<MockSource<GeocodeResult>>,
    pub weather: Arc<MockSource<WeatherReading>>,
    pub soil_grid: Arc<MockSource<SoilGridReading>>,
    pub classifier: Arc<MockClassifier>,
    pub cache: Arc<SqliteCacheStore>,
    pub repository: Arc<SqliteAnalysisRepository>,
}

impl Harness {
    pub async fn new(
        geocoder: Arc<MockSource<GeocodeResult>>,
        weather: Arc<MockSource<WeatherReading>>,
        soil_grid: Arc<MockSource<SoilGridReading>>,
    ) -> Self {
        let (dir, pool) = create_test_db().await;
        Self {
            _dir: dir,
            cache: Arc::new(SqliteCacheStore::new(pool.clone(), TEST_LOCK_WAIT_MS)),
            repository: Arc::new(SqliteAnalysisRepository::new(pool.clone(), TEST_LOCK_WAIT_MS)),
            pool,
            geocoder,
            weather,
            soil_grid,
            classifier: MockClassifier::new(SoilTypeLabel::Black),
        }
    }

    /// Every source answers immediately with its fixture
    pub async fn all_live() -> Self {
        Self::new(
            MockSource::new("geocoder", Behavior::Succeed(geocode_fixture())),
            MockSource::new("weather", Behavior::Succeed(weather_fixture())),
            MockSource::new("soil_grid", Behavior::Succeed(soil_grid_fixture())),
        )
        .await
    }

    /// Every source fails with a network error
    pub async fn all_failing() -> Self {
        Self::new(
            MockSource::new("geocoder", network_down()),
            MockSource::new("weather", network_down()),
            MockSource::new("soil_grid", network_down()),
        )
        .await
    }

    pub fn sources(&self) -> ScanSources {
        ScanSources {
            geocoder: self.geocoder.clone(),
            weather: self.weather.clone(),
            soil_grid: self.soil_grid.clone(),
            classifier: self.classifier.clone(),
        }
    }

    pub fn engine(&self) -> FusionEngine {
        FusionEngine::new(self.sources(), self.cache.clone(), self.repository.clone())
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }
}

/// Report with fixed values, captured at `minute` past 09:00 on 2025-03-14
pub fn sample_report(minute: u32, soil_type: SoilTypeLabel) -> SoilReport {
    let captured_at: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 3, 14, 9, minute, 0).unwrap();
    SoilReport {
        id: None,
        captured_at,
        coordinates: Some(pune()),
        location_name: Sourced::live("Pune, Maharashtra".to_string()),
        district: Some("Pune".to_string()),
        environmental: EnvironmentalSnapshot {
            weather_summary: Sourced::live("31°C | 64%".to_string()),
            soil_moisture: Sourced::live(Some(0.25)),
            temperature: Sourced::live(31.0),
            humidity: Sourced::live(64.0),
            precipitation: Sourced::cached(0.5),
            weather_code: Some(3),
        },
        nutrients: NutrientEstimate {
            nitrogen: 280.0,
            phosphorus: 20.0,
            potassium: 120.0,
            ph: 6.8,
            source: Provenance::Live,
            unavailable: Vec::new(),
        },
        detected_soil_type: soil_type,
        user_notes: format!("plot {}", minute),
    }
}

/// Small solid-colour PNG
pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 48, image::Rgb(color));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
    buf.into_inner()
}
