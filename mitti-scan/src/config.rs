//! Configuration for mitti-scan
//!
//! Priority: environment variables → TOML file → compiled defaults. Every
//! field has a default, so an absent config file is not an error.

use crate::fusion::adapters::geocoder::DEFAULT_NOMINATIM_URL;
use crate::fusion::adapters::soil_grid::DEFAULT_SOILGRIDS_URL;
use crate::fusion::adapters::weather::DEFAULT_OPEN_METEO_URL;
use crate::models::Coordinates;
use mitti_common::config::load_toml;
use mitti_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Config file name looked up inside the root folder
pub const CONFIG_FILE_NAME: &str = "mitti-scan.toml";

pub const DEFAULT_PORT: u16 = 5730;

pub const GEOCODER_URL_ENV: &str = "MITTI_GEOCODER_URL";
pub const WEATHER_URL_ENV: &str = "MITTI_WEATHER_URL";
pub const SOIL_GRID_URL_ENV: &str = "MITTI_SOIL_GRID_URL";
pub const MODEL_PATH_ENV: &str = "MITTI_MODEL_PATH";

/// One upstream HTTP service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl EndpointConfig {
    fn new(base_url: &str, timeout_seconds: u64) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout_seconds,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Weather location for scans with no coordinates and no cached weather
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub bind_address: String,
    pub port: u16,
    /// Relative paths resolve against the root folder
    pub database_file: PathBuf,
    /// Relative paths resolve against the root folder
    pub model_path: PathBuf,
    pub geocoder: EndpointConfig,
    pub weather: EndpointConfig,
    pub soil_grid: EndpointConfig,
    /// Set to `None` to skip weather entirely when location is denied
    pub default_weather_coordinates: Option<DefaultCoordinates>,
    pub max_lock_wait_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_file: PathBuf::from("mitti.db"),
            model_path: PathBuf::from("soil_classifier.onnx"),
            geocoder: EndpointConfig::new(DEFAULT_NOMINATIM_URL, 10),
            weather: EndpointConfig::new(DEFAULT_OPEN_METEO_URL, 15),
            soil_grid: EndpointConfig::new(DEFAULT_SOILGRIDS_URL, 15),
            default_weather_coordinates: Some(DefaultCoordinates {
                latitude: 20.5937,
                longitude: 78.9629,
            }),
            max_lock_wait_ms: 5000,
        }
    }
}

impl ScanConfig {
    /// Load from `path` (defaults if the file is absent), then apply env overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match load_toml::<ScanConfig>(path)? {
            Some(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            None => {
                info!("No config at {}, using defaults", path.display());
                ScanConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(url) = env(GEOCODER_URL_ENV) {
            self.geocoder.base_url = url;
        }
        if let Some(url) = env(WEATHER_URL_ENV) {
            self.weather.base_url = url;
        }
        if let Some(url) = env(SOIL_GRID_URL_ENV) {
            self.soil_grid.base_url = url;
        }
        if let Some(path) = env(MODEL_PATH_ENV) {
            self.model_path = PathBuf::from(path);
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, endpoint) in [
            ("geocoder", &self.geocoder),
            ("weather", &self.weather),
            ("soil_grid", &self.soil_grid),
        ] {
            if endpoint.timeout_seconds == 0 {
                return Err(Error::Config(format!("{}.timeout_seconds must be > 0", name)));
            }
        }

        self.default_weather_coordinates()?;
        Ok(())
    }

    /// Validated default weather coordinates
    pub fn default_weather_coordinates(&self) -> Result<Option<Coordinates>> {
        self.default_weather_coordinates
            .map(|c| {
                Coordinates::new(c.latitude, c.longitude)
                    .map_err(|e| Error::Config(format!("default_weather_coordinates: {}", e)))
            })
            .transpose()
    }
}
