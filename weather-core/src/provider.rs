use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::model::{Coordinates, WeatherReading};

pub mod open_meteo;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("weather request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather provider returned status {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("malformed weather response: {0}")]
    Malformed(String),
}

/// A source of current weather conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions for the given coordinates.
    ///
    /// Coordinates are validated by construction; implementations do not
    /// re-check ranges. Transport failures and timeouts come back as
    /// [`FetchError`] values, never as panics.
    async fn current(&self, coords: Coordinates) -> Result<WeatherReading, FetchError>;
}
