//! Weather observation and client configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public OpenWeatherMap endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Upper bound on retries of a transient failure
pub const MAX_TRANSIENT_RETRIES: u32 = 1;

/// Current conditions at a location, as reported by the provider.
///
/// Produced once per request and consumed once; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Location name as resolved by the provider
    pub location: String,
    /// Air temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity, 0-100 %
    pub humidity: f64,
    /// Short condition text, e.g. "light rain"
    pub description: String,
}

/// Settings for the live weather client
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Provider base URL, without the trailing `/weather`
    pub base_url: String,
    /// Provider credential; requests fail fast when absent
    pub api_key: Option<String>,
    /// Bound on a single attempt, including reading the body
    pub timeout: Duration,
    /// Extra attempts after a transient failure (clamped to 1)
    pub max_retries: u32,
    /// Fixed delay before a retry
    pub retry_backoff: Duration,
    /// Upper bound of the random delay added to `retry_backoff`
    pub retry_jitter: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
            max_retries: MAX_TRANSIENT_RETRIES,
            retry_backoff: Duration::from_millis(200),
            retry_jitter: Duration::from_millis(250),
        }
    }
}

impl WeatherConfig {
    /// Config pointing at `base_url` with default timings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the provider credential
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Configure the per-attempt timeout (default: 5s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure transient retries (default: 1, never more than 1)
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.min(MAX_TRANSIENT_RETRIES);
        self
    }

    /// Configure retry back-off and jitter (default: 200ms + up to 250ms)
    pub fn with_retry_delay(mut self, backoff: Duration, jitter: Duration) -> Self {
        self.retry_backoff = backoff;
        self.retry_jitter = jitter;
        self
    }
}
