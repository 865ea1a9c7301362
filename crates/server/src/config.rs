//! Engine configuration, read once at startup.
//!
//! Values come from the process environment (after loading `.env` when one
//! exists). Parsing goes through a lookup function so tests never touch the
//! real environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use weather::{DEFAULT_BASE_URL, MAX_TRANSIENT_RETRIES, WeatherConfig};

pub const DEFAULT_MODEL_PATH: &str = "data/crop_model.json";
pub const DEFAULT_DATASET_PATH: &str = "data/crop_data.csv";
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {variable}: '{value}' ({reason})")]
    InvalidValue {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything needed to build an `EngineContext`
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub dataset_path: PathBuf,
    pub weather: WeatherConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            weather: WeatherConfig::default()
                .with_timeout(Duration::from_secs(DEFAULT_WEATHER_TIMEOUT_SECS)),
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {:?}", path),
            Err(e) => debug!("No .env file loaded: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (variable name -> value).
    ///
    /// Unset or blank variables take their defaults. Malformed numbers
    /// are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = get("CROP_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = get("CROP_DATASET_PATH") {
            config.dataset_path = PathBuf::from(path);
        }

        let base_url = get("WEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = parse_var("WEATHER_TIMEOUT_SECS", get("WEATHER_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_WEATHER_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                variable: "WEATHER_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }
        let max_retries = parse_var("WEATHER_MAX_RETRIES", get("WEATHER_MAX_RETRIES"))?
            .unwrap_or(MAX_TRANSIENT_RETRIES);

        let mut weather = WeatherConfig::new(base_url)
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_max_retries(max_retries);
        if let Some(key) = get("WEATHER_API_KEY") {
            weather = weather.with_api_key(key);
        }
        config.weather = weather;

        Ok(config)
    }

    /// Override the classifier artifact path
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Override the reference dataset path
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }
}

fn parse_var<T>(variable: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                variable,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.model_path, PathBuf::from("data/crop_model.json"));
        assert_eq!(config.dataset_path, PathBuf::from("data/crop_data.csv"));
        assert_eq!(config.weather.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.weather.api_key, None);
        assert_eq!(config.weather.timeout, Duration::from_secs(5));
        assert_eq!(config.weather.max_retries, 1);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("CROP_MODEL_PATH", "/models/forest.json"),
            ("CROP_DATASET_PATH", "/data/ref.csv"),
            ("WEATHER_API_KEY", "secret"),
            ("WEATHER_BASE_URL", "http://127.0.0.1:9000"),
            ("WEATHER_TIMEOUT_SECS", "2"),
            ("WEATHER_MAX_RETRIES", "0"),
        ]))
        .unwrap();

        assert_eq!(config.model_path, PathBuf::from("/models/forest.json"));
        assert_eq!(config.dataset_path, PathBuf::from("/data/ref.csv"));
        assert_eq!(config.weather.api_key.as_deref(), Some("secret"));
        assert_eq!(config.weather.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.weather.timeout, Duration::from_secs(2));
        assert_eq!(config.weather.max_retries, 0);
    }

    #[test]
    fn test_retries_are_clamped() {
        let config =
            EngineConfig::from_lookup(lookup_from(&[("WEATHER_MAX_RETRIES", "7")])).unwrap();
        assert_eq!(config.weather.max_retries, 1);
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = EngineConfig::from_lookup(lookup_from(&[("WEATHER_API_KEY", "  ")])).unwrap();
        assert_eq!(config.weather.api_key, None);
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("WEATHER_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                variable: "WEATHER_TIMEOUT_SECS",
                ..
            }
        ));

        let err =
            EngineConfig::from_lookup(lookup_from(&[("WEATHER_MAX_RETRIES", "-1")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                variable: "WEATHER_MAX_RETRIES",
                ..
            }
        ));

        assert!(EngineConfig::from_lookup(lookup_from(&[("WEATHER_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn test_path_overrides() {
        let config = EngineConfig::default()
            .with_model_path("m.json")
            .with_dataset_path("d.csv");
        assert_eq!(config.model_path, PathBuf::from("m.json"));
        assert_eq!(config.dataset_path, PathBuf::from("d.csv"));
    }
}
