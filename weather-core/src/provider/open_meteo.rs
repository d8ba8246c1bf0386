use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{Coordinates, WeatherReading};

use super::{FetchError, WeatherProvider};

/// Current-conditions variables requested from Open-Meteo.
const CURRENT_VARIABLES: &str =
    "temperature_2m,apparent_temperature,weather_code,wind_speed_10m";

/// Weather provider backed by the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    latitude: f64,
    longitude: f64,
    utc_offset_seconds: i32,
    current: OmCurrent,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    /// Unix timestamp; the request asks for `timeformat=unixtime`.
    time: i64,
    #[serde(rename = "temperature_2m")]
    temperature: f64,
    apparent_temperature: f64,
    weather_code: i32,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: f64,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current(&self, coords: Coordinates) -> Result<WeatherReading, FetchError> {
        let url = format!("{}/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", coords.latitude().to_string()),
                ("longitude", coords.longitude().to_string()),
                ("current", CURRENT_VARIABLES.to_string()),
                ("timeformat", "unixtime".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Upstream {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OmResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        // Open-Meteo echoes grid-snapped coordinates; those are the ones
        // the observation actually describes.
        let coordinates = Coordinates::new(parsed.latitude, parsed.longitude)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let observed_at = local_observation_time(parsed.current.time, parsed.utc_offset_seconds)
            .ok_or_else(|| {
                FetchError::Malformed(format!(
                    "unrepresentable observation time {} (offset {}s)",
                    parsed.current.time, parsed.utc_offset_seconds
                ))
            })?;

        Ok(WeatherReading {
            city: None,
            coordinates,
            temperature_c: parsed.current.temperature,
            apparent_temperature_c: parsed.current.apparent_temperature,
            wind_speed_kmh: parsed.current.wind_speed,
            weather_code: parsed.current.weather_code,
            observed_at,
        })
    }
}

fn local_observation_time(unix: i64, offset_seconds: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_seconds)?;
    let utc = Utc.timestamp_opt(unix, 0).single()?;
    Some(utc.with_timezone(&offset))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
