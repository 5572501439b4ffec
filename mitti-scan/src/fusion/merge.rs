// Merge step
//
// Pure function from four resolved inputs to one SoilReport. Every field is
// filled: live value, else cached value, else the documented default.

use super::adapters::{GeocodeResult, SoilGridReading, WeatherReading};
use super::Resolved;
use crate::error::{ScanError, ScanResult};
use crate::models::report::UNKNOWN_LOCATION;
use crate::models::{
    Coordinates, EnvironmentalSnapshot, SoilReport, SoilTypeLabel, Sourced, NO_NOTES_PLACEHOLDER,
};
use crate::nutrients::NutrientEstimate;
use chrono::{DateTime, Utc};

/// Per-scan values that do not come from a data source
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub captured_at: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
    pub notes: String,
}

/// The four branches after the merge barrier
#[derive(Debug, Clone)]
pub struct MergeInputs {
    pub geocode: Resolved<GeocodeResult>,
    pub weather: Resolved<WeatherReading>,
    pub soil_grid: Resolved<SoilGridReading>,
    pub soil_type: SoilTypeLabel,
}

fn environment(weather: Resolved<WeatherReading>) -> EnvironmentalSnapshot {
    let tag = weather.provenance();
    match weather.into_value() {
        Some(reading) => EnvironmentalSnapshot {
            weather_summary: Sourced { value: reading.summary(), source: tag },
            soil_moisture: Sourced { value: reading.soil_moisture, source: tag },
            temperature: Sourced { value: reading.temperature, source: tag },
            humidity: Sourced { value: reading.humidity, source: tag },
            precipitation: Sourced { value: reading.precipitation, source: tag },
            weather_code: reading.weather_code,
        },
        None => EnvironmentalSnapshot::defaults(),
    }
}

fn check_finite(field: &str, value: f64) -> ScanResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ScanError::MergeInvariant(format!("{} is {}", field, value)))
    }
}

/// Build the report for one scan
///
/// Fails only when the inputs would produce a non-finite number, which no
/// adapter is allowed to return.
pub fn merge(context: ScanContext, inputs: MergeInputs) -> ScanResult<SoilReport> {
    let location_tag = inputs.geocode.provenance();
    let (location_name, district) = match inputs.geocode {
        Resolved::Live(geo) | Resolved::Cached(geo) if !geo.place_name.trim().is_empty() => (
            Sourced {
                value: geo.place_name,
                source: location_tag,
            },
            geo.district,
        ),
        _ => (Sourced::default_value(UNKNOWN_LOCATION.to_string()), None),
    };

    let soil_tag = inputs.soil_grid.provenance();
    let nutrients = match inputs.soil_grid.into_value() {
        Some(reading) => reading.to_estimate(soil_tag),
        None => NutrientEstimate::fallback(inputs.soil_type),
    };

    let environmental = environment(inputs.weather);

    let notes = context.notes.trim();
    let user_notes = if notes.is_empty() {
        NO_NOTES_PLACEHOLDER.to_string()
    } else {
        notes.to_string()
    };

    check_finite("nitrogen", nutrients.nitrogen)?;
    check_finite("phosphorus", nutrients.phosphorus)?;
    check_finite("potassium", nutrients.potassium)?;
    check_finite("ph", nutrients.ph)?;
    check_finite("temperature", environmental.temperature.value)?;
    check_finite("humidity", environmental.humidity.value)?;
    check_finite("precipitation", environmental.precipitation.value)?;
    if let Some(moisture) = environmental.soil_moisture.value {
        check_finite("soil_moisture", moisture)?;
    }

    Ok(SoilReport {
        id: None,
        captured_at: context.captured_at,
        coordinates: context.coordinates,
        location_name,
        district,
        environmental,
        nutrients,
        detected_soil_type: inputs.soil_type,
        user_notes,
    })
}
