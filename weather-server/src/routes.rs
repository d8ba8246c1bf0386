//! The `/weather` route: parse input, resolve a location, fetch conditions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use weather_core::{
    Config, Coordinates, ErrorBody, GeocodeError, Geocoder, NominatimGeocoder, OpenMeteoProvider,
    WeatherProvider, WeatherReport,
};

/// Shared state handed to every request.
///
/// The upstream clients sit behind trait objects so tests can substitute
/// doubles. Nothing here is mutated after startup; the handler is a pure
/// function of its inputs plus these two stateless clients.
pub struct AppState {
    pub geocoder: Box<dyn Geocoder>,
    pub weather: Box<dyn WeatherProvider>,
    pub default_location: Option<Coordinates>,
    pub verbose_errors: bool,
}

impl AppState {
    /// Construct the production state from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let geocoder = NominatimGeocoder::new(
            config.geocoder.base_url.clone(),
            &config.geocoder.user_agent,
            config.geocoder_timeout(),
        )?;
        let weather =
            OpenMeteoProvider::new(config.weather.base_url.clone(), config.weather_timeout())?;

        let default_location = config
            .default_location
            .map(|loc| loc.coordinates())
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid default_location in config: {e}"))?;

        Ok(Self {
            geocoder: Box::new(geocoder),
            weather: Box::new(weather),
            default_location,
            verbose_errors: config.server.verbose_errors,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/weather", get(get_weather))
        .with_state(state)
}

/// Query parameters for `GET /weather`.
///
/// `lat`/`lon` arrive as raw strings so an unparsable number produces this
/// service's own 400 body instead of a framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// Request-level failures, each carrying its HTTP mapping.
#[derive(Debug)]
pub enum ApiError {
    MissingLocation,
    InvalidCoordinate { message: String },
    CityNotFound,
    GeocodeFailed { detail: String, verbose: bool },
    FetchFailed { detail: String, verbose: bool },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingLocation | ApiError::InvalidCoordinate { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::CityNotFound => StatusCode::NOT_FOUND,
            ApiError::GeocodeFailed { .. } => StatusCode::BAD_GATEWAY,
            ApiError::FetchFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::MissingLocation => "Missing latitude and longitude".to_string(),
            ApiError::InvalidCoordinate { message } => message.clone(),
            ApiError::CityNotFound => "City not found".to_string(),
            ApiError::GeocodeFailed { detail, verbose } => {
                if *verbose {
                    detail.clone()
                } else {
                    "Geocoding service unavailable".to_string()
                }
            }
            ApiError::FetchFailed { detail, verbose } => {
                if *verbose {
                    detail.clone()
                } else {
                    "Failed to fetch weather data".to_string()
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

struct ResolvedLocation {
    coordinates: Coordinates,
    /// Set when the request came in by name; echoed back in the report.
    city: Option<String>,
}

/// `GET /weather?city=<name>` or `GET /weather?lat=<f64>&lon=<f64>`.
pub async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherReport>, ApiError> {
    let location = resolve_location(&state, &query).await?;

    let mut reading = state
        .weather
        .current(location.coordinates)
        .await
        .map_err(|e| {
            tracing::error!("weather fetch failed: {e}");
            ApiError::FetchFailed {
                detail: e.to_string(),
                verbose: state.verbose_errors,
            }
        })?;

    reading.city = match location.city {
        Some(name) => Some(name),
        None => state.geocoder.reverse(reading.coordinates).await,
    };

    Ok(Json(WeatherReport::from(&reading)))
}

async fn resolve_location(
    state: &AppState,
    query: &WeatherQuery,
) -> Result<ResolvedLocation, ApiError> {
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty());

    // A city name wins; client-supplied coordinates are discarded.
    if let Some(city) = city {
        tracing::debug!(city, "resolving place name");
        let coordinates = state.geocoder.resolve(city).await.map_err(|e| match e {
            GeocodeError::NotFound => ApiError::CityNotFound,
            other => {
                tracing::error!("geocoding failed: {other}");
                ApiError::GeocodeFailed {
                    detail: other.to_string(),
                    verbose: state.verbose_errors,
                }
            }
        })?;

        return Ok(ResolvedLocation {
            coordinates,
            city: Some(city.to_string()),
        });
    }

    let lat = parse_coordinate("lat", query.lat.as_deref())?;
    let lon = parse_coordinate("lon", query.lon.as_deref())?;

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let coordinates = Coordinates::new(lat, lon).map_err(|e| ApiError::InvalidCoordinate {
                message: e.to_string(),
            })?;
            Ok(ResolvedLocation {
                coordinates,
                city: None,
            })
        }
        _ => {
            let coordinates = state.default_location.ok_or(ApiError::MissingLocation)?;
            Ok(ResolvedLocation {
                coordinates,
                city: None,
            })
        }
    }
}

fn parse_coordinate(name: &str, raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::InvalidCoordinate {
                message: format!("Invalid value for '{name}'"),
            }),
    }
}
