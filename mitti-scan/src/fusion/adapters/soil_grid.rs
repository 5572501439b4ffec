//! Soil property estimates via ISRIC SoilGrids
//!
//! The response nests `properties.layers`, one layer per property, each with
//! per-depth mean values. A missing layer or a null mean is recorded as
//! unavailable instead of failing the whole fetch.

use super::{build_client, fetch_json, trim_base_url, SourceAdapter};
use crate::error::{ScanError, ScanResult};
use crate::models::{Coordinates, Provenance};
use crate::nutrients::{self, NutrientEstimate, SoilProperty};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SOILGRIDS_URL: &str = "https://rest.isric.org";

/// Depth interval queried and preferred when several are returned
pub const TOPSOIL_DEPTH: &str = "0-5cm";

/// Raw soil-grid values, in the service's units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilGridReading {
    /// cg/kg
    pub nitrogen_cg_kg: Option<f64>,
    /// pH × 10
    pub phh2o_x10: Option<f64>,
    /// Soil organic carbon
    pub soc: Option<f64>,
    /// %
    pub clay_pct: Option<f64>,
}

impl SoilGridReading {
    fn raw(&self, property: SoilProperty) -> Option<f64> {
        match property {
            SoilProperty::Nitrogen => self.nitrogen_cg_kg,
            SoilProperty::Phh2o => self.phh2o_x10,
            SoilProperty::Soc => self.soc,
            SoilProperty::Clay => self.clay_pct,
        }
    }

    fn set_raw(&mut self, property: SoilProperty, value: f64) {
        let slot = match property {
            SoilProperty::Nitrogen => &mut self.nitrogen_cg_kg,
            SoilProperty::Phh2o => &mut self.phh2o_x10,
            SoilProperty::Soc => &mut self.soc,
            SoilProperty::Clay => &mut self.clay_pct,
        };
        *slot = Some(value);
    }

    /// Properties the response did not carry
    pub fn unavailable(&self) -> Vec<SoilProperty> {
        SoilProperty::ALL
            .into_iter()
            .filter(|p| self.raw(*p).is_none())
            .collect()
    }

    /// Convert to kg/ha and pH; missing raw values count as 0
    pub fn to_estimate(&self, source: Provenance) -> NutrientEstimate {
        NutrientEstimate {
            nitrogen: nutrients::nitrogen_kg_ha(self.nitrogen_cg_kg.unwrap_or(0.0)),
            phosphorus: nutrients::phosphorus_kg_ha(self.soc.unwrap_or(0.0)),
            potassium: nutrients::potassium_kg_ha(self.clay_pct.unwrap_or(0.0)),
            ph: nutrients::ph_from_phh2o(self.phh2o_x10.unwrap_or(0.0)),
            source,
            unavailable: self.unavailable(),
        }
    }
}

/// Mean of the topsoil depth, or of the first depth listed
fn depth_mean(depths: &Value) -> Option<f64> {
    let mean_of = |depth: &Value| depth.pointer("/values/mean").and_then(Value::as_f64);

    match depths {
        Value::Array(items) => items
            .iter()
            .find(|d| d.get("label").and_then(Value::as_str) == Some(TOPSOIL_DEPTH))
            .or_else(|| items.first())
            .and_then(mean_of),
        Value::Object(map) => map
            .get(TOPSOIL_DEPTH)
            .or_else(|| map.values().next())
            .and_then(mean_of),
        _ => None,
    }
}

/// Parse a SoilGrids properties response
///
/// Layers may be a list of objects with a `name` field or an object keyed by
/// property name. Only a missing `properties.layers` is an error.
pub fn parse_soil_grid(body: &Value) -> ScanResult<SoilGridReading> {
    let layers = body
        .pointer("/properties/layers")
        .ok_or_else(|| ScanError::Parse("soil-grid response has no properties.layers".to_string()))?;

    let named_layers: Vec<(&str, &Value)> = match layers {
        Value::Array(items) => items
            .iter()
            .filter_map(|layer| Some((layer.get("name")?.as_str()?, layer)))
            .collect(),
        Value::Object(map) => map.iter().map(|(name, layer)| (name.as_str(), layer)).collect(),
        _ => {
            return Err(ScanError::Parse(
                "properties.layers is neither a list nor an object".to_string(),
            ))
        }
    };

    let mut reading = SoilGridReading::default();
    for (name, layer) in named_layers {
        let Some(property) = SoilProperty::from_layer_name(name) else {
            continue;
        };
        if let Some(mean) = layer.get("depths").and_then(depth_mean) {
            reading.set_raw(property, mean);
        }
    }

    Ok(reading)
}

/// ISRIC SoilGrids v2 adapter
pub struct SoilGridsAdapter {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl SoilGridsAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> ScanResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: trim_base_url(base_url),
            timeout,
        })
    }
}

#[async_trait]
impl SourceAdapter for SoilGridsAdapter {
    type Output = SoilGridReading;

    fn source_id(&self) -> &'static str {
        "soil_grid"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, coordinates: Coordinates) -> ScanResult<SoilGridReading> {
        let mut query: Vec<(&str, String)> = vec![
            ("lon", coordinates.longitude.to_string()),
            ("lat", coordinates.latitude.to_string()),
        ];
        query.extend(
            SoilProperty::ALL
                .iter()
                .map(|p| ("property", p.layer_name().to_string())),
        );
        query.push(("depth", TOPSOIL_DEPTH.to_string()));
        query.push(("value", "mean".to_string()));

        let request = self
            .client
            .get(format!("{}/soilgrids/v2.0/properties/query", self.base_url))
            .query(&query);

        let body: Value = fetch_json(request, self.timeout).await?;
        let reading = parse_soil_grid(&body)?;

        debug!(
            unavailable = ?reading.unavailable(),
            "Soil-grid properties fetched"
        );
        Ok(reading)
    }
}
