//! Weather-driven field advisories
//!
//! Derived from current conditions only; nothing here touches the network or
//! the cache.

use serde::Serialize;

/// Icon and text for a WMO weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherDescription {
    pub icon: &'static str,
    pub text: &'static str,
}

pub fn weather_description(code: i32) -> WeatherDescription {
    let (icon, text) = match code {
        0 => ("☀️", "Clear sky"),
        1 => ("🌤️", "Mainly clear"),
        2 => ("⛅", "Partly cloudy"),
        3 => ("☁️", "Overcast"),
        45 => ("🌫️", "Foggy"),
        48 => ("🌫️", "Depositing rime fog"),
        51 => ("🌦️", "Light drizzle"),
        53 => ("🌦️", "Moderate drizzle"),
        55 => ("🌧️", "Dense drizzle"),
        61 => ("🌧️", "Slight rain"),
        63 => ("🌧️", "Moderate rain"),
        65 => ("⛈️", "Heavy rain"),
        71 => ("🌨️", "Slight snow"),
        73 => ("🌨️", "Moderate snow"),
        75 => ("❄️", "Heavy snow"),
        77 => ("🌨️", "Snow grains"),
        80 => ("🌦️", "Slight rain showers"),
        81 => ("⛈️", "Moderate rain showers"),
        82 => ("⛈️", "Violent rain showers"),
        85 => ("🌨️", "Slight snow showers"),
        86 => ("❄️", "Heavy snow showers"),
        95 => ("⛈️", "Thunderstorm"),
        96 => ("⛈️", "Thunderstorm with slight hail"),
        99 => ("⛈️", "Thunderstorm with heavy hail"),
        _ => ("🌈", "Unknown"),
    };

    WeatherDescription { icon, text }
}

/// Field advisories for the given conditions
///
/// Temperature in °C, humidity in %, wind speed in km/h, precipitation in mm.
/// Always returns at least one entry.
pub fn agricultural_advisories(
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
    precipitation: f64,
) -> Vec<&'static str> {
    let mut advisories = Vec::new();

    if temperature < 5.0 {
        advisories.push("Frost Risk: Protect sensitive crops from cold damage.");
    } else if temperature > 35.0 {
        advisories.push("Heat Warning: Increase irrigation and provide shade.");
    } else if temperature > 30.0 {
        advisories.push("High Temperature: Monitor water needs closely.");
    }

    if precipitation > 5.0 {
        advisories.push("Heavy Rain: Delay irrigation and check drainage.");
    } else if precipitation > 0.0 {
        advisories.push("Light Rain: Adjust irrigation schedule.");
    }

    if wind_speed > 50.0 {
        advisories.push("Strong Winds: Secure equipment and check supports.");
    } else if wind_speed > 30.0 {
        advisories.push("Moderate Winds: Monitor young plants.");
    }

    if humidity > 85.0 {
        advisories.push("High Humidity: Watch for fungal diseases.");
    } else if humidity < 30.0 {
        advisories.push("Low Humidity: Increase watering frequency.");
    }

    if advisories.is_empty() {
        advisories.push("Favorable Conditions: Good for agricultural activities.");
    }

    advisories
}

/// Pest and disease pressure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PestRisk {
    Low,
    Medium,
    High,
}

/// Risk level plus the action to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PestRiskAssessment {
    pub level: PestRisk,
    pub advice: Option<&'static str>,
}

/// Warm and humid conditions favour fungal disease and sap-sucking insects.
pub fn pest_risk(temperature: f64, humidity: f64) -> PestRiskAssessment {
    let (level, advice) = if humidity > 80.0 && temperature > 20.0 && temperature < 35.0 {
        (
            PestRisk::High,
            Some("Fungal diseases likely! Apply preventive fungicide."),
        )
    } else if humidity > 70.0 && temperature > 25.0 {
        (PestRisk::Medium, Some("Monitor for aphids and whiteflies."))
    } else if humidity > 85.0 {
        (
            PestRisk::Medium,
            Some("High humidity may cause mold. Improve ventilation."),
        )
    } else if temperature < 10.0 {
        (PestRisk::Low, Some("Cold weather suppresses pest activity."))
    } else {
        (PestRisk::Low, None)
    };

    PestRiskAssessment { level, advice }
}

/// Irrigation recommendation
///
/// `soil_moisture` is volumetric (m³/m³).
pub fn irrigation_advice(
    temperature: f64,
    humidity: f64,
    precipitation: f64,
    soil_moisture: f64,
) -> &'static str {
    if precipitation > 10.0 {
        "Skip irrigation today - sufficient rainfall received."
    } else if soil_moisture > 0.3 {
        "Soil moisture adequate. Light irrigation if needed."
    } else if temperature > 35.0 && humidity < 40.0 {
        "Critical! Irrigate immediately - high evaporation risk."
    } else if temperature > 30.0 {
        "Irrigate in early morning or evening to reduce evaporation."
    } else {
        "Normal irrigation schedule recommended."
    }
}
