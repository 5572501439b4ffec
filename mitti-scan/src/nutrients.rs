//! Nutrient estimates and status bands
//!
//! Soil-grid raw values are converted with fixed linear calibrations:
//! - nitrogen kg/ha = nitrogen cg/kg × 2.0
//! - pH = phh2o (pH × 10) / 10.0
//! - phosphorus kg/ha = 10 + soc × 0.2
//! - potassium kg/ha = 50 + clay % × 3.5
//!
//! The band thresholds below are agronomic calibration values and are kept
//! exactly as-is.

use crate::models::{Provenance, SoilTypeLabel};
use serde::{Deserialize, Serialize};

/// Nitrogen used when no soil-grid data is available (kg/ha)
pub const DEFAULT_NITROGEN_KG_HA: f64 = 140.0;
/// Phosphorus used when no soil-grid data is available (kg/ha)
pub const DEFAULT_PHOSPHORUS_KG_HA: f64 = 25.0;
/// Potassium used when no soil-grid data is available (kg/ha)
pub const DEFAULT_POTASSIUM_KG_HA: f64 = 80.0;
/// pH used when no soil-grid data is available
pub const DEFAULT_PH: f64 = 6.5;

/// nitrogen cg/kg -> kg/ha
pub fn nitrogen_kg_ha(raw_nitrogen_cg_kg: f64) -> f64 {
    raw_nitrogen_cg_kg * 2.0
}

/// phh2o (pH × 10) -> pH
pub fn ph_from_phh2o(raw_phh2o_x10: f64) -> f64 {
    raw_phh2o_x10 / 10.0
}

/// soil organic carbon -> phosphorus kg/ha
pub fn phosphorus_kg_ha(raw_soc: f64) -> f64 {
    10.0 + raw_soc * 0.2
}

/// clay % -> potassium kg/ha
pub fn potassium_kg_ha(raw_clay_pct: f64) -> f64 {
    50.0 + raw_clay_pct * 3.5
}

/// Soil-grid property queried for a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilProperty {
    Nitrogen,
    Phh2o,
    Soc,
    Clay,
}

impl SoilProperty {
    pub const ALL: [SoilProperty; 4] = [
        SoilProperty::Nitrogen,
        SoilProperty::Phh2o,
        SoilProperty::Soc,
        SoilProperty::Clay,
    ];

    /// Layer name used by the soil-grid API
    pub fn layer_name(&self) -> &'static str {
        match self {
            SoilProperty::Nitrogen => "nitrogen",
            SoilProperty::Phh2o => "phh2o",
            SoilProperty::Soc => "soc",
            SoilProperty::Clay => "clay",
        }
    }

    pub fn from_layer_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.layer_name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Normalized NPK + pH estimate of one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientEstimate {
    /// kg/ha
    pub nitrogen: f64,
    /// kg/ha
    pub phosphorus: f64,
    /// kg/ha
    pub potassium: f64,
    pub ph: f64,
    pub source: Provenance,
    /// Soil-grid layers that were missing; their values were computed from 0
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<SoilProperty>,
}

impl NutrientEstimate {
    /// Estimate used when neither a live nor a cached soil-grid reading exists
    ///
    /// P and K come from the regional baseline of the detected soil type when
    /// the scan produced a real classification.
    pub fn fallback(soil_type: SoilTypeLabel) -> Self {
        let (phosphorus, potassium) = if soil_type.is_classified() {
            let baseline = soil_type_baseline(soil_type);
            (baseline.phosphorus, baseline.potassium)
        } else {
            (DEFAULT_PHOSPHORUS_KG_HA, DEFAULT_POTASSIUM_KG_HA)
        };

        Self {
            nitrogen: DEFAULT_NITROGEN_KG_HA,
            phosphorus,
            potassium,
            ph: DEFAULT_PH,
            source: Provenance::Default,
            unavailable: Vec::new(),
        }
    }

    pub fn statuses(&self) -> NutrientStatuses {
        NutrientStatuses {
            nitrogen: nitrogen_status(self.nitrogen),
            phosphorus: phosphorus_status(self.phosphorus),
            potassium: potassium_status(self.potassium),
            ph: ph_status(self.ph),
        }
    }
}

/// Qualitative band of a nutrient value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientLevel {
    Low,
    Optimal,
    High,
}

impl NutrientLevel {
    /// Display colour for the band
    pub fn color(&self) -> &'static str {
        match self {
            NutrientLevel::Low => "#FBC02D",
            NutrientLevel::Optimal => "#1976D2",
            NutrientLevel::High => "#D32F2F",
        }
    }
}

/// Band plus display metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NutrientStatus {
    pub level: NutrientLevel,
    pub label: &'static str,
    pub color: &'static str,
}

/// Statuses for all four fields of an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NutrientStatuses {
    pub nitrogen: NutrientStatus,
    pub phosphorus: NutrientStatus,
    pub potassium: NutrientStatus,
    pub ph: NutrientStatus,
}

struct Band {
    low_below: f64,
    high_above: f64,
    labels: [&'static str; 3],
}

const NITROGEN_BAND: Band = Band {
    low_below: 280.0,
    high_above: 560.0,
    labels: ["Low", "Ideal", "High"],
};

const PHOSPHORUS_BAND: Band = Band {
    low_below: 10.0,
    high_above: 25.0,
    labels: ["Low", "Ideal", "High"],
};

const POTASSIUM_BAND: Band = Band {
    low_below: 108.0,
    high_above: 280.0,
    labels: ["Low", "Ideal", "High"],
};

const PH_BAND: Band = Band {
    low_below: 6.0,
    high_above: 7.5,
    labels: ["Acidic", "Neutral", "Alkaline"],
};

// Both thresholds belong to the optimal band.
fn classify(band: &Band, value: f64) -> NutrientStatus {
    let (level, label) = if value < band.low_below {
        (NutrientLevel::Low, band.labels[0])
    } else if value > band.high_above {
        (NutrientLevel::High, band.labels[2])
    } else {
        (NutrientLevel::Optimal, band.labels[1])
    };

    NutrientStatus {
        level,
        label,
        color: level.color(),
    }
}

pub fn nitrogen_status(kg_ha: f64) -> NutrientStatus {
    classify(&NITROGEN_BAND, kg_ha)
}

pub fn phosphorus_status(kg_ha: f64) -> NutrientStatus {
    classify(&PHOSPHORUS_BAND, kg_ha)
}

pub fn potassium_status(kg_ha: f64) -> NutrientStatus {
    classify(&POTASSIUM_BAND, kg_ha)
}

pub fn ph_status(ph: f64) -> NutrientStatus {
    classify(&PH_BAND, ph)
}

/// Regional average P and K for a soil type (kg/ha)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientBaseline {
    pub phosphorus: f64,
    pub potassium: f64,
}

/// Baseline for a soil type; labels without a table entry use Loam
pub fn soil_type_baseline(soil_type: SoilTypeLabel) -> NutrientBaseline {
    let (phosphorus, potassium) = match soil_type {
        SoilTypeLabel::Alluvial => (18.0, 300.0),
        SoilTypeLabel::Black => (15.0, 350.0),
        SoilTypeLabel::Red => (12.0, 200.0),
        SoilTypeLabel::Laterite => (10.0, 100.0),
        SoilTypeLabel::Sandy => (25.0, 250.0),
        SoilTypeLabel::Clay => (20.0, 280.0),
        SoilTypeLabel::Yellow => (15.0, 180.0),
        SoilTypeLabel::Peaty => (10.0, 80.0),
        SoilTypeLabel::Chalky => (12.0, 120.0),
        _ => (25.0, 250.0),
    };

    NutrientBaseline {
        phosphorus,
        potassium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nitrogen_transform_is_exact() {
        assert_eq!(nitrogen_kg_ha(140.0), 280.0);
        assert_eq!(nitrogen_kg_ha(0.0), 0.0);
    }

    #[test]
    fn test_ph_transform_is_exact() {
        assert_eq!(ph_from_phh2o(68.0), 6.8);
        assert_eq!(ph_from_phh2o(55.0), 5.5);
    }

    #[test]
    fn test_phosphorus_and_potassium_transforms() {
        assert_eq!(phosphorus_kg_ha(0.0), 10.0);
        assert_eq!(phosphorus_kg_ha(50.0), 20.0);
        assert_eq!(potassium_kg_ha(0.0), 50.0);
        assert_eq!(potassium_kg_ha(20.0), 120.0);
    }

    #[test]
    fn test_nitrogen_bands() {
        assert_eq!(nitrogen_status(100.0).level, NutrientLevel::Low);
        assert_eq!(nitrogen_status(100.0).label, "Low");
        assert_eq!(nitrogen_status(400.0).label, "Ideal");
        assert_eq!(nitrogen_status(600.0).level, NutrientLevel::High);
        // Boundaries are optimal
        assert_eq!(nitrogen_status(280.0).level, NutrientLevel::Optimal);
        assert_eq!(nitrogen_status(560.0).level, NutrientLevel::Optimal);
    }

    #[test]
    fn test_phosphorus_and_potassium_bands() {
        assert_eq!(phosphorus_status(5.0).level, NutrientLevel::Low);
        assert_eq!(phosphorus_status(15.0).level, NutrientLevel::Optimal);
        assert_eq!(phosphorus_status(30.0).level, NutrientLevel::High);
        assert_eq!(potassium_status(50.0).level, NutrientLevel::Low);
        assert_eq!(potassium_status(200.0).level, NutrientLevel::Optimal);
        assert_eq!(potassium_status(300.0).level, NutrientLevel::High);
    }

    #[test]
    fn test_ph_bands_and_labels() {
        let acidic = ph_status(ph_from_phh2o(55.0));
        assert_eq!(acidic.level, NutrientLevel::Low);
        assert_eq!(acidic.label, "Acidic");
        assert_eq!(acidic.color, "#FBC02D");

        let alkaline = ph_status(ph_from_phh2o(80.0));
        assert_eq!(alkaline.level, NutrientLevel::High);
        assert_eq!(alkaline.label, "Alkaline");

        assert_eq!(ph_status(6.8).label, "Neutral");
        assert_eq!(ph_status(6.0).level, NutrientLevel::Optimal);
        assert_eq!(ph_status(7.5).level, NutrientLevel::Optimal);
    }

    #[test]
    fn test_fallback_uses_soil_type_baseline() {
        let estimate = NutrientEstimate::fallback(SoilTypeLabel::Black);
        assert_eq!(estimate.nitrogen, DEFAULT_NITROGEN_KG_HA);
        assert_eq!(estimate.phosphorus, 15.0);
        assert_eq!(estimate.potassium, 350.0);
        assert_eq!(estimate.ph, DEFAULT_PH);
        assert_eq!(estimate.source, Provenance::Default);
    }

    #[test]
    fn test_fallback_without_classification_uses_defaults() {
        for label in [
            SoilTypeLabel::NotScanned,
            SoilTypeLabel::AnalysisError,
            SoilTypeLabel::Unknown,
        ] {
            let estimate = NutrientEstimate::fallback(label);
            assert_eq!(estimate.phosphorus, DEFAULT_PHOSPHORUS_KG_HA);
            assert_eq!(estimate.potassium, DEFAULT_POTASSIUM_KG_HA);
        }
    }

    #[test]
    fn test_layer_names_round_trip() {
        for property in SoilProperty::ALL {
            assert_eq!(SoilProperty::from_layer_name(property.layer_name()), Some(property));
        }
        assert_eq!(SoilProperty::from_layer_name("bdod"), None);
    }
}
