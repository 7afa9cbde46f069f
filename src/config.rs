use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_ARCHIVE_URL: &str =
    "https://plvr.land.moi.gov.tw//Download?type=zip&fileName=lvr_landcsv.zip";
const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_WEATHER_ENDPOINT: &str =
    "https://opendata.cwa.gov.tw/api/v1/rest/datastore/F-C0032-001";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub geocoder: GeocoderConfig,
    pub news: NewsConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the extracted CSV files
    pub dir: PathBuf,
    pub archive_url: String,
    pub download_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Sled,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub cache_backend: CacheBackend,
    /// Defaults to `<data.dir>/location_cache`
    pub cache_path: Option<PathBuf>,
    /// Provider failures are retried after this many seconds; unset or 0 caches them forever
    pub failure_retry_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    pub timeout_secs: u64,
    pub headline_limit: usize,
}

/// Central Weather Administration 36-hour forecast
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WeatherConfig {
    pub endpoint: String,
    /// Open-data authorization key; the weather view is unavailable without one
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("real_estate_data"),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            download_timeout_secs: 30,
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODER_ENDPOINT.to_string(),
            user_agent: "realestatemap".to_string(),
            timeout_secs: 10,
            cache_backend: CacheBackend::Sled,
            cache_path: None,
            failure_retry_secs: Some(86_400),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            headline_limit: 10,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.geocoder.cache_path.clone().unwrap_or_else(|| {
            let name = match self.geocoder.cache_backend {
                CacheBackend::Sled => "location_cache",
                CacheBackend::Json => "location_cache.json",
            };
            self.data.dir.join(name)
        })
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn failure_retry(&self) -> Option<chrono::Duration> {
        self.failure_retry_secs
            .filter(|secs| *secs > 0)
            .and_then(|secs| chrono::Duration::try_seconds(secs as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:5000");
        assert_eq!(config.data.dir, PathBuf::from("real_estate_data"));
        assert_eq!(config.geocoder.cache_backend, CacheBackend::Sled);
        assert_eq!(config.geocoder.failure_retry_secs, Some(86_400));
        assert_eq!(config.news.headline_limit, 10);
        assert!(config.weather.api_key.is_none());
        assert_eq!(config.weather.timeout_secs, 10);
    }

    #[test]
    fn test_weather_key_from_file() {
        let config: Config =
            toml::from_str("[weather]\napi_key = \"CWA-0000\"\n").unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("CWA-0000"));
        assert!(config.weather.endpoint.ends_with("F-C0032-001"));
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: Config = toml::from_str(
            r#"
            [data]
            dir = "/srv/lvr"

            [geocoder]
            cache_backend = "json"
            timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.data.dir, PathBuf::from("/srv/lvr"));
        assert_eq!(config.data.download_timeout_secs, 30);
        assert_eq!(config.geocoder.timeout(), Duration::from_secs(3));
        assert_eq!(
            config.geocoder.failure_retry(),
            chrono::Duration::try_seconds(86_400)
        );
        assert_eq!(
            config.cache_path(),
            PathBuf::from("/srv/lvr/location_cache.json")
        );
    }

    #[test]
    fn test_zero_retry_disables_failure_retry() {
        let config: Config = toml::from_str("[geocoder]\nfailure_retry_secs = 0\n").unwrap();
        assert!(config.geocoder.failure_retry().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lvrmap.toml");
        fs::write(&path, "[server]\nlisten = \"127.0.0.1:8080\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert!(Config::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }
}
