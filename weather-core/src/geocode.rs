use std::{fmt::Debug, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::model::Coordinates;

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The provider answered, but had no match for the place name.
    /// Distinct from the transport failures below: callers map this to
    /// "not found", never to an upstream outage.
    #[error("no match for place name")]
    NotFound,

    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geocoder returned status {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("malformed geocoder response: {0}")]
    Malformed(String),
}

/// Resolves place names to coordinates and back.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Resolve a free-text place name to its best-match coordinates.
    async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodeError>;

    /// Best-effort lookup of a place name for coordinates.
    ///
    /// Decorative only: every failure maps to `None`, so a missing name
    /// never turns into a request error.
    async fn reverse(&self, coords: Coordinates) -> Option<String>;
}

/// Geocoder backed by Nominatim (OpenStreetMap). Free, no API key, but the
/// usage policy requires an identifying user agent.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build geocoder HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

/// One hit from the Nominatim search endpoint. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ReversePlace {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!("{}/search", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(GeocodeError::Upstream {
                status,
                body: truncate_body(&body),
            });
        }

        let hits: Vec<SearchHit> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;

        let hit = hits.into_iter().next().ok_or(GeocodeError::NotFound)?;

        let latitude = hit
            .lat
            .parse::<f64>()
            .map_err(|_| GeocodeError::Malformed(format!("unparsable latitude '{}'", hit.lat)))?;
        let longitude = hit
            .lon
            .parse::<f64>()
            .map_err(|_| GeocodeError::Malformed(format!("unparsable longitude '{}'", hit.lon)))?;

        Coordinates::new(latitude, longitude).map_err(|e| GeocodeError::Malformed(e.to_string()))
    }

    async fn reverse(&self, coords: Coordinates) -> Option<String> {
        let url = format!("{}/reverse", self.base_url);

        let res = match self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.latitude().to_string()),
                ("lon", coords.longitude().to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                tracing::debug!("reverse geocode request failed: {e}");
                return None;
            }
        };

        if !res.status().is_success() {
            tracing::debug!(status = %res.status(), "reverse geocode returned non-success");
            return None;
        }

        let place: ReversePlace = match res.json().await {
            Ok(place) => place,
            Err(e) => {
                tracing::debug!("reverse geocode parse error: {e}");
                return None;
            }
        };

        let addr = place.address?;

        // City-level granularity: city > town > village.
        addr.city.or(addr.town).or(addr.village)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
