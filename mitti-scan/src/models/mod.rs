//! Data model for the soil-scan pipeline
//!
//! - `Coordinates`: device location captured for one scan
//! - `SoilTypeLabel`: classifier output, fixed enumeration
//! - `SoilReport`: the fused, immutable analysis record

pub mod report;
pub mod soil_type;

pub use report::{
    EnvironmentalSnapshot, Provenance, ReportComparison, SoilReport, Sourced,
    NO_NOTES_PLACEHOLDER,
};
pub use soil_type::SoilTypeLabel;

use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};

/// Device coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validate latitude [-90, 90] and longitude [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> ScanResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ScanError::InvalidInput(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ScanError::InvalidInput(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_accept_bounds() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(Coordinates::new(18.5204, 73.8567).is_ok());
    }

    #[test]
    fn test_coordinates_reject_out_of_range() {
        assert!(matches!(
            Coordinates::new(90.5, 0.0),
            Err(ScanError::InvalidInput(_))
        ));
        assert!(matches!(
            Coordinates::new(0.0, -180.1),
            Err(ScanError::InvalidInput(_))
        ));
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }
}
