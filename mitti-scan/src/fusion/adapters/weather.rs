//! Current weather and shallow soil moisture via Open-Meteo

use super::{build_client, fetch_json, trim_base_url, SourceAdapter};
use crate::advisory;
use crate::error::{ScanError, ScanResult};
use crate::models::report::format_weather_summary;
use crate::models::Coordinates;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,weather_code,wind_speed_10m,soil_moisture_0_to_1cm";

/// Conditions at the scan location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// mm
    pub precipitation: f64,
    /// Volumetric, 0-1 cm (m³/m³)
    #[serde(default)]
    pub soil_moisture: Option<f64>,
    /// km/h
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
}

impl WeatherReading {
    pub fn summary(&self) -> String {
        format_weather_summary(self.temperature, self.humidity)
    }

    pub fn advisories(&self) -> Vec<&'static str> {
        advisory::agricultural_advisories(
            self.temperature,
            self.humidity,
            self.wind_speed.unwrap_or(0.0),
            self.precipitation,
        )
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<i32>,
    wind_speed_10m: Option<f64>,
    soil_moisture_0_to_1cm: Option<f64>,
}

impl TryFrom<ForecastResponse> for WeatherReading {
    type Error = ScanError;

    fn try_from(response: ForecastResponse) -> ScanResult<Self> {
        let current = response
            .current
            .ok_or_else(|| ScanError::Parse("weather response has no `current` block".to_string()))?;

        let temperature = current
            .temperature_2m
            .ok_or_else(|| ScanError::Parse("missing temperature_2m".to_string()))?;
        let humidity = current
            .relative_humidity_2m
            .ok_or_else(|| ScanError::Parse("missing relative_humidity_2m".to_string()))?;

        Ok(WeatherReading {
            temperature,
            humidity,
            precipitation: current.precipitation.unwrap_or(0.0),
            soil_moisture: current.soil_moisture_0_to_1cm,
            wind_speed: current.wind_speed_10m,
            weather_code: current.weather_code,
        })
    }
}

/// Open-Meteo forecast adapter (current conditions only)
pub struct OpenMeteoAdapter {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> ScanResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: trim_base_url(base_url),
            timeout,
        })
    }
}

#[async_trait]
impl SourceAdapter for OpenMeteoAdapter {
    type Output = WeatherReading;

    fn source_id(&self) -> &'static str {
        "weather"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, coordinates: Coordinates) -> ScanResult<WeatherReading> {
        let request = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ]);

        let response: ForecastResponse = fetch_json(request, self.timeout).await?;
        let reading = WeatherReading::try_from(response)?;

        debug!(
            summary = %reading.summary(),
            soil_moisture = ?reading.soil_moisture,
            "Weather fetched"
        );
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ScanResult<WeatherReading> {
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        WeatherReading::try_from(response)
    }

    #[test]
    fn test_full_current_block() {
        let reading = parse(
            r#"{"current": {"temperature_2m": 31.4, "relative_humidity_2m": 64,
                "precipitation": 0.2, "weather_code": 2, "wind_speed_10m": 12.5,
                "soil_moisture_0_to_1cm": 0.27}}"#,
        )
        .unwrap();

        assert_eq!(reading.summary(), "31°C | 64%");
        assert_eq!(reading.soil_moisture, Some(0.27));
        assert_eq!(reading.weather_code, Some(2));
    }

    #[test]
    fn test_soil_moisture_is_optional() {
        let reading = parse(r#"{"current": {"temperature_2m": 25.0, "relative_humidity_2m": 50}}"#).unwrap();
        assert_eq!(reading.soil_moisture, None);
        assert_eq!(reading.precipitation, 0.0);
    }

    #[test]
    fn test_missing_temperature_is_parse_error() {
        let result = parse(r#"{"current": {"relative_humidity_2m": 50}}"#);
        assert!(matches!(result, Err(ScanError::Parse(_))));
    }

    #[test]
    fn test_missing_current_is_parse_error() {
        assert!(matches!(parse(r#"{"hourly": {}}"#), Err(ScanError::Parse(_))));
    }
}
