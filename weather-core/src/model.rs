use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wmo;

#[derive(Debug, Error, PartialEq)]
pub enum CoordinatesError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A validated latitude/longitude pair.
///
/// Construction goes through [`Coordinates::new`], so downstream code
/// (notably the weather provider) never re-checks ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and build a pair. Non-finite values fail the range checks.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::Longitude(longitude));
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinates {
    /// Display form used in responses, rounded to 4 decimal places.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Lat: {:.4}°N Lon: {:.4}°E",
            self.latitude, self.longitude
        )
    }
}

/// Current conditions for one location, scoped to a single request.
#[derive(Debug, Clone)]
pub struct WeatherReading {
    /// Place name, if one was requested or recovered by reverse geocoding.
    pub city: Option<String>,
    pub coordinates: Coordinates,
    pub temperature_c: f64,
    pub apparent_temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
    /// Observation time carried with the location's UTC offset.
    pub observed_at: DateTime<FixedOffset>,
}

/// The serialized response shape for `GET /weather`.
///
/// Field names and formats are part of the API contract; serialization is
/// deterministic, so identical readings produce byte-identical JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Coordinates")]
    pub coordinates: String,
    #[serde(rename = "Current temperature")]
    pub temperature: String,
    #[serde(rename = "Current apparent temperature")]
    pub apparent_temperature: String,
    #[serde(rename = "Current wind speed")]
    pub wind_speed: String,
    #[serde(rename = "Current weather code")]
    pub weather_code: i32,
    #[serde(rename = "Weather description")]
    pub weather_description: String,
    #[serde(rename = "Last update")]
    pub last_update: String,
}

impl From<&WeatherReading> for WeatherReport {
    fn from(reading: &WeatherReading) -> Self {
        Self {
            city: reading.city.clone(),
            coordinates: reading.coordinates.to_string(),
            temperature: format!("{:.1}°C", reading.temperature_c),
            apparent_temperature: format!("{:.1}°C", reading.apparent_temperature_c),
            wind_speed: format!("{:.1} km/h", reading.wind_speed_kmh),
            weather_code: reading.weather_code,
            weather_description: wmo::describe(reading.weather_code).to_string(),
            last_update: reading.observed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// The single error shape returned by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
