//! Upstream data-source adapters
//!
//! Each adapter issues one HTTP request, parses the response into its own
//! result type and classifies failures. Adapters are stateless with respect to
//! the cache; fallback is the fusion engine's job.

pub mod geocoder;
pub mod soil_grid;
pub mod weather;

pub use geocoder::{GeocodeResult, NominatimGeocoder};
pub use soil_grid::{SoilGridReading, SoilGridsAdapter};
pub use weather::{OpenMeteoAdapter, WeatherReading};

use crate::error::{ScanError, ScanResult};
use crate::models::Coordinates;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User agent sent to every upstream service
pub const USER_AGENT: &str = concat!("Mitti/", env!("CARGO_PKG_VERSION"));

/// A data source queried by coordinates
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Output: Send + 'static;

    /// Short identifier for logs
    fn source_id(&self) -> &'static str;

    /// Time budget for one fetch
    fn timeout(&self) -> Duration;

    async fn fetch(&self, coordinates: Coordinates) -> ScanResult<Self::Output>;
}

pub(crate) fn build_client() -> ScanResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ScanError::Network(format!("HTTP client init failed: {}", e)))
}

fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> ScanError {
    if err.is_timeout() {
        ScanError::Timeout(timeout)
    } else if err.is_decode() {
        ScanError::Parse(err.to_string())
    } else {
        ScanError::Network(err.to_string())
    }
}

/// Send a request and decode a JSON body
///
/// Non-2xx statuses become `Upstream`, bodies that do not match `T` become
/// `Parse`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> ScanResult<T> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_transport_error(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScanError::Upstream(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| classify_transport_error(e, timeout))?;

    serde_json::from_slice(&body).map_err(|e| ScanError::Parse(e.to_string()))
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
