// Fusion Engine
//
// One RunScan: dispatch geocode, weather, soil-grid and classifier together,
// wait for all four, merge, persist.

use super::adapters::{GeocodeResult, SoilGridReading, SourceAdapter, WeatherReading};
use super::merge::{merge, MergeInputs, ScanContext};
use super::Resolved;
use crate::cache::{self, CacheRecord, CacheStore};
use crate::classifier::SoilClassifier;
use crate::db::AnalysisStore;
use crate::error::{ScanError, ScanResult};
use crate::models::{Coordinates, SoilReport, SoilTypeLabel};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Input of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub image: Option<Bytes>,
    /// `None` when location permission was denied
    pub coordinates: Option<Coordinates>,
    pub notes: String,
}

impl ScanRequest {
    pub fn new(image: Option<Bytes>, coordinates: Option<Coordinates>, notes: impl Into<String>) -> Self {
        Self {
            image,
            coordinates,
            notes: notes.into(),
        }
    }
}

/// Data sources consulted by every scan
#[derive(Clone)]
pub struct ScanSources {
    pub geocoder: Arc<dyn SourceAdapter<Output = GeocodeResult>>,
    pub weather: Arc<dyn SourceAdapter<Output = WeatherReading>>,
    pub soil_grid: Arc<dyn SourceAdapter<Output = SoilGridReading>>,
    pub classifier: Arc<dyn SoilClassifier>,
}

pub struct FusionEngine {
    sources: ScanSources,
    cache: Arc<dyn CacheStore>,
    repository: Arc<dyn AnalysisStore>,
    default_weather_coordinates: Option<Coordinates>,
}

impl FusionEngine {
    pub fn new(
        sources: ScanSources,
        cache: Arc<dyn CacheStore>,
        repository: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            sources,
            cache,
            repository,
            default_weather_coordinates: None,
        }
    }

    /// Coordinates for the weather fetch when the scan has none and no
    /// weather is cached
    pub fn with_default_weather_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.default_weather_coordinates = coordinates;
        self
    }

    /// Run one scan to completion and persist the report
    ///
    /// Network, cache and classifier failures are absorbed into cached or
    /// default values. Errors are limited to persistence failures, merge
    /// invariant violations and invalid coordinates.
    pub async fn run_scan(&self, request: ScanRequest) -> ScanResult<SoilReport> {
        self.run_scan_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// As [`run_scan`](Self::run_scan), abandoning the scan if `cancel` fires
    /// before every branch has resolved
    ///
    /// In-flight requests are dropped and nothing is persisted. A classifier
    /// run already on a blocking thread completes and its result is discarded.
    pub async fn run_scan_with_cancel(
        &self,
        request: ScanRequest,
        cancel: &CancellationToken,
    ) -> ScanResult<SoilReport> {
        if let Some(c) = request.coordinates {
            Coordinates::new(c.latitude, c.longitude)?;
        }

        let captured_at = Utc::now();
        info!(
            has_image = request.image.is_some(),
            has_location = request.coordinates.is_some(),
            "Scan started"
        );

        let inputs = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Scan cancelled before merge");
                return Err(ScanError::Cancelled);
            }
            inputs = self.gather(&request) => inputs,
        };

        let context = ScanContext {
            captured_at,
            coordinates: request.coordinates,
            notes: request.notes,
        };
        let report = merge(context, inputs).map_err(|e| {
            error!(error = %e, "Merge produced an invalid report");
            e
        })?;

        let id = self.repository.insert(&report).await.map_err(|e| {
            error!(error = %e, "Failed to persist soil report");
            ScanError::Persistence(e.to_string())
        })?;

        info!(
            analysis_id = id,
            soil_type = %report.detected_soil_type,
            location = %report.location_name.value,
            fully_live = report.is_fully_live(),
            "Scan complete"
        );
        Ok(report.with_id(id))
    }

    /// Merge barrier: resolves only when all four branches have
    async fn gather(&self, request: &ScanRequest) -> MergeInputs {
        let coordinates = request.coordinates;

        let (geocode, weather, soil_grid, soil_type) = tokio::join!(
            self.resolve(self.sources.geocoder.as_ref(), coordinates),
            self.resolve_weather(coordinates),
            self.resolve(self.sources.soil_grid.as_ref(), coordinates),
            self.classify(request.image.clone()),
        );

        MergeInputs {
            geocode,
            weather,
            soil_grid,
            soil_type,
        }
    }

    async fn classify(&self, image: Option<Bytes>) -> SoilTypeLabel {
        match image {
            Some(bytes) => self.sources.classifier.classify(bytes).await,
            None => {
                debug!("No image supplied, soil type not scanned");
                SoilTypeLabel::NotScanned
            }
        }
    }

    /// Weather for the scan location, or without one: last-known cached
    /// weather first, then a fetch at the default coordinates
    ///
    /// Default-coordinate readings describe another place, so they are
    /// tagged `Regional` and never written to the cache.
    async fn resolve_weather(&self, coordinates: Option<Coordinates>) -> Resolved<WeatherReading> {
        let adapter = self.sources.weather.as_ref();
        if coordinates.is_some() {
            return self.resolve(adapter, coordinates).await;
        }

        if let Some(cached) = cache::load_record::<WeatherReading>(self.cache.as_ref()).await {
            debug!(source = adapter.source_id(), "No location, using cached weather");
            return Resolved::Cached(cached);
        }

        let Some(fallback) = self.default_weather_coordinates else {
            debug!(source = adapter.source_id(), "No location and nothing cached, using defaults");
            return Resolved::Unavailable;
        };

        match fetch_with_timeout(adapter, fallback).await {
            Ok(reading) => {
                info!(
                    source = adapter.source_id(),
                    coordinates = %fallback,
                    "No location, using weather for the default coordinates"
                );
                Resolved::Regional(reading)
            }
            Err(err) => {
                warn!(
                    source = adapter.source_id(),
                    error = %err,
                    "Default-coordinate fetch failed and nothing cached, using defaults"
                );
                Resolved::Unavailable
            }
        }
    }

    /// Fetch with timeout; cache on success, fall back to cache on failure
    async fn resolve<R>(
        &self,
        adapter: &dyn SourceAdapter<Output = R>,
        coordinates: Option<Coordinates>,
    ) -> Resolved<R>
    where
        R: CacheRecord + 'static,
    {
        let source = adapter.source_id();

        let outcome = match coordinates {
            None => Err(ScanError::PermissionDenied),
            Some(coordinates) => fetch_with_timeout(adapter, coordinates).await,
        };

        match outcome {
            Ok(value) => {
                debug!(source, "Live value obtained");
                if let Err(e) = cache::store_record(self.cache.as_ref(), &value).await {
                    warn!(source, error = %e, "Cache write failed, continuing with live value");
                }
                Resolved::Live(value)
            }
            Err(err) => match cache::load_record::<R>(self.cache.as_ref()).await {
                Some(cached) => {
                    warn!(source, error = %err, "Fetch failed, using cached value");
                    Resolved::Cached(cached)
                }
                None => {
                    warn!(source, error = %err, "Fetch failed and nothing cached, using defaults");
                    Resolved::Unavailable
                }
            },
        }
    }
}

async fn fetch_with_timeout<R>(
    adapter: &dyn SourceAdapter<Output = R>,
    coordinates: Coordinates,
) -> ScanResult<R>
where
    R: Send + 'static,
{
    let budget = adapter.timeout();
    match tokio::time::timeout(budget, adapter.fetch(coordinates)).await {
        Ok(result) => result,
        Err(_) => Err(ScanError::Timeout(budget)),
    }
}
