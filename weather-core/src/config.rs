use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::{Coordinates, CoordinatesError};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// When true, 5xx bodies carry the upstream error text instead of a
    /// fixed message. Keep off in production.
    pub verbose_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            verbose_errors: false,
        }
    }
}

/// Settings for the Nominatim geocoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,

    /// Nominatim's usage policy requires an identifying user agent.
    pub user_agent: String,

    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
                .to_string(),
            timeout_secs: 10,
        }
    }
}

/// Settings for the Open-Meteo weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Opt-in fallback location used when a request carries no usable location.
/// When absent (the default), such requests fail with 400 instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl DefaultLocation {
    pub fn coordinates(&self) -> Result<Coordinates, CoordinatesError> {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Top-level configuration, stored as TOML on disk.
///
/// Every section has defaults, so a missing file or an empty one yields a
/// working configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub geocoder: GeocoderConfig,
    pub weather: WeatherConfig,
    pub default_location: Option<DefaultLocation>,
}

impl Config {
    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_secs)
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_secs(self.weather.timeout_secs)
    }

    /// Load config from an explicit path, or from the platform config
    /// directory.
    ///
    /// An explicitly named file must exist; the platform file may be absent,
    /// in which case the defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file not found: {}", path.display()));
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::config_file_path()?;
                if !path.exists() {
                    // First run: no config file, use defaults.
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-service", "weather-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let cfg = Config::default();

        assert_eq!(cfg.server.bind_addr.port(), 8080);
        assert!(!cfg.server.verbose_errors);
        assert!(cfg.geocoder.base_url.starts_with("https://"));
        assert!(cfg.weather.base_url.starts_with("https://"));
        assert_eq!(cfg.geocoder_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.weather_timeout(), Duration::from_secs(10));
        assert!(cfg.default_location.is_none());
    }

    #[test]
    fn full_file_parses() {
        let cfg: Config = toml::from_str(
            r#"
            [server]
            bind_addr = "0.0.0.0:9000"
            verbose_errors = true

            [geocoder]
            base_url = "https://geo.example.com"
            user_agent = "custom-agent/1.0"
            timeout_secs = 3

            [weather]
            base_url = "https://meteo.example.com/v1"
            timeout_secs = 7

            [default_location]
            latitude = 37.7749
            longitude = -122.4194
            "#,
        )
        .expect("config must parse");

        assert_eq!(cfg.server.bind_addr.port(), 9000);
        assert!(cfg.server.verbose_errors);
        assert_eq!(cfg.geocoder.base_url, "https://geo.example.com");
        assert_eq!(cfg.geocoder.user_agent, "custom-agent/1.0");
        assert_eq!(cfg.geocoder_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.weather_timeout(), Duration::from_secs(7));

        let coords = cfg.default_location.unwrap().coordinates().unwrap();
        assert!((coords.latitude() - 37.7749).abs() < 1e-9);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [server]
            verbose_errors = true
            "#,
        )
        .expect("config must parse");

        assert!(cfg.server.verbose_errors);
        assert_eq!(cfg.server.bind_addr.port(), 8080);
        assert_eq!(cfg.weather.base_url, "https://api.open-meteo.com/v1");
        assert!(cfg.default_location.is_none());
    }

    #[test]
    fn default_location_is_range_checked() {
        let loc = DefaultLocation {
            latitude: 95.0,
            longitude: 0.0,
        };
        assert!(loc.coordinates().is_err());
    }

    #[test]
    fn load_reads_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[server]\nbind_addr = \"127.0.0.1:9999\"").expect("write");

        let cfg = Config::load(Some(file.path())).expect("load must succeed");
        assert_eq!(cfg.server.bind_addr.port(), 9999);
    }

    #[test]
    fn load_errors_on_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/weather.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn load_errors_on_broken_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "this is not toml = =").expect("write");

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
