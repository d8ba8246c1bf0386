//! Core library for the weather HTTP service.
//!
//! This crate defines:
//! - Configuration handling
//! - Abstractions over the geocoding and weather upstreams, plus their
//!   concrete HTTP clients
//! - Shared domain models (coordinates, readings, the wire-level report)
//! - The WMO weather-code table
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod config;
pub mod geocode;
pub mod model;
pub mod provider;
pub mod wmo;

pub use config::{Config, DefaultLocation, GeocoderConfig, ServerConfig, WeatherConfig};
pub use geocode::{GeocodeError, Geocoder, NominatimGeocoder};
pub use model::{Coordinates, CoordinatesError, ErrorBody, WeatherReading, WeatherReport};
pub use provider::{FetchError, WeatherProvider, open_meteo::OpenMeteoProvider};
