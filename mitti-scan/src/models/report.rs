//! Fused soil report and its environmental snapshot

use super::{Coordinates, SoilTypeLabel};
use crate::advisory;
use crate::nutrients::{NutrientEstimate, NutrientStatuses};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored in place of empty user notes
pub const NO_NOTES_PLACEHOLDER: &str = "No notes added";

/// Location name when neither geocoder nor cache produced one
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Weather summary when neither weather service nor cache produced one
pub const WEATHER_UNAVAILABLE: &str = "Weather unavailable";

pub const DEFAULT_TEMPERATURE_C: f64 = 30.0;
pub const DEFAULT_HUMIDITY_PCT: f64 = 60.0;
pub const DEFAULT_PRECIPITATION_MM: f64 = 0.0;
/// Volumetric soil moisture (m³/m³)
pub const DEFAULT_SOIL_MOISTURE: f64 = 0.2;

/// Where a fused value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Fetched during this scan
    Live,
    /// Recovered from the last-known cache
    Cached,
    /// Fetched during this scan for the configured default location, not the
    /// scan location
    Regional,
    /// Hard-coded fallback constant
    Default,
}

/// Value tagged with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: Provenance,
}

impl<T> Sourced<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            source: Provenance::Live,
        }
    }

    pub fn cached(value: T) -> Self {
        Self {
            value,
            source: Provenance::Cached,
        }
    }

    pub fn default_value(value: T) -> Self {
        Self {
            value,
            source: Provenance::Default,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == Provenance::Live
    }
}

/// Display form of current conditions, e.g. `"31°C | 64%"`
pub fn format_weather_summary(temperature: f64, humidity: f64) -> String {
    format!("{:.0}°C | {:.0}%", temperature, humidity)
}

/// Weather and shallow-soil telemetry at scan time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalSnapshot {
    pub weather_summary: Sourced<String>,
    /// Absent when the weather service had no soil-moisture reading
    pub soil_moisture: Sourced<Option<f64>>,
    /// °C
    pub temperature: Sourced<f64>,
    /// %
    pub humidity: Sourced<f64>,
    /// mm
    pub precipitation: Sourced<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_code: Option<i32>,
}

impl EnvironmentalSnapshot {
    /// Snapshot built entirely from the fallback constants
    pub fn defaults() -> Self {
        Self {
            weather_summary: Sourced::default_value(WEATHER_UNAVAILABLE.to_string()),
            soil_moisture: Sourced::default_value(Some(DEFAULT_SOIL_MOISTURE)),
            temperature: Sourced::default_value(DEFAULT_TEMPERATURE_C),
            humidity: Sourced::default_value(DEFAULT_HUMIDITY_PCT),
            precipitation: Sourced::default_value(DEFAULT_PRECIPITATION_MM),
            weather_code: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.weather_summary.is_live()
            && self.soil_moisture.is_live()
            && self.temperature.is_live()
            && self.humidity.is_live()
            && self.precipitation.is_live()
    }

    pub fn irrigation_advice(&self) -> &'static str {
        advisory::irrigation_advice(
            self.temperature.value,
            self.humidity.value,
            self.precipitation.value,
            self.soil_moisture.value.unwrap_or(DEFAULT_SOIL_MOISTURE),
        )
    }
}

/// One completed scan
///
/// Built once by the fusion engine and never edited afterwards; `id` is
/// assigned by the analysis repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReport {
    pub id: Option<i64>,
    /// Capture time, not persistence time
    pub captured_at: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
    pub location_name: Sourced<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub environmental: EnvironmentalSnapshot,
    pub nutrients: NutrientEstimate,
    pub detected_soil_type: SoilTypeLabel,
    pub user_notes: String,
}

impl SoilReport {
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// True when location, weather and soil-grid data were all fetched live
    /// and the soil grid returned every layer
    pub fn is_fully_live(&self) -> bool {
        self.location_name.is_live()
            && self.environmental.is_live()
            && self.nutrients.source == Provenance::Live
            && self.nutrients.unavailable.is_empty()
    }

    pub fn nutrient_statuses(&self) -> NutrientStatuses {
        self.nutrients.statuses()
    }

    /// Nutrient deltas from `baseline` to this report
    pub fn compare(&self, baseline: &SoilReport) -> ReportComparison {
        ReportComparison {
            from_id: baseline.id,
            to_id: self.id,
            nitrogen: self.nutrients.nitrogen - baseline.nutrients.nitrogen,
            phosphorus: self.nutrients.phosphorus - baseline.nutrients.phosphorus,
            potassium: self.nutrients.potassium - baseline.nutrients.potassium,
            ph: self.nutrients.ph - baseline.nutrients.ph,
        }
    }
}

/// Per-nutrient change between two reports (positive means increase)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportComparison {
    pub from_id: Option<i64>,
    pub to_id: Option<i64>,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
}
