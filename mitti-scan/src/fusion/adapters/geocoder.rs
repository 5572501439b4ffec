//! Reverse geocoding via Nominatim

use super::{build_client, fetch_json, trim_base_url, SourceAdapter};
use crate::error::{ScanError, ScanResult};
use crate::models::Coordinates;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Place name and administrative district for a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// `"{locality}, {state}"`
    pub place_name: String,
    #[serde(default)]
    pub district: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    suburb: Option<String>,
    state: Option<String>,
    state_district: Option<String>,
    county: Option<String>,
}

impl Address {
    fn into_result(self) -> GeocodeResult {
        let locality = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.hamlet)
            .or(self.suburb)
            .unwrap_or_else(|| "Unknown".to_string());

        let place_name = match self.state {
            Some(state) => format!("{}, {}", locality, state),
            None => locality,
        };

        GeocodeResult {
            place_name,
            district: self.state_district.or(self.county),
        }
    }
}

/// Nominatim reverse geocoder
///
/// Nominatim's usage policy allows one request per second per client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, timeout: Duration) -> ScanResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: trim_base_url(base_url),
            timeout,
            rate_limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
        })
    }
}

#[async_trait]
impl SourceAdapter for NominatimGeocoder {
    type Output = GeocodeResult;

    fn source_id(&self) -> &'static str {
        "geocoder"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, coordinates: Coordinates) -> ScanResult<GeocodeResult> {
        self.rate_limiter.until_ready().await;

        let request = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ]);

        let response: ReverseResponse = fetch_json(request, self.timeout).await?;

        if let Some(error) = response.error {
            return Err(ScanError::Parse(format!("geocoder error: {}", error)));
        }
        let address = response
            .address
            .ok_or_else(|| ScanError::Parse("geocoder response has no address".to_string()))?;

        let result = address.into_result();
        debug!(place = %result.place_name, "Reverse geocode resolved");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeocodeResult {
        let response: ReverseResponse = serde_json::from_str(json).unwrap();
        response.address.unwrap().into_result()
    }

    #[test]
    fn test_city_and_state() {
        let result = parse(
            r#"{"address": {"city": "Pune", "state_district": "Pune District", "state": "Maharashtra"}}"#,
        );
        assert_eq!(result.place_name, "Pune, Maharashtra");
        assert_eq!(result.district.as_deref(), Some("Pune District"));
    }

    #[test]
    fn test_village_falls_back_after_city_and_town() {
        let result = parse(r#"{"address": {"village": "Khed", "county": "Ratnagiri", "state": "Maharashtra"}}"#);
        assert_eq!(result.place_name, "Khed, Maharashtra");
        assert_eq!(result.district.as_deref(), Some("Ratnagiri"));
    }

    #[test]
    fn test_missing_locality_is_unknown() {
        let result = parse(r#"{"address": {"state": "Rajasthan"}}"#);
        assert_eq!(result.place_name, "Unknown, Rajasthan");
        assert_eq!(result.district, None);
    }
}
