//! OpenWeatherMap client
//!
//! Fetches current conditions with a single bounded request per attempt.
//!
//! ## Failure handling
//! - Timeouts and connection failures are transient: one retry after a
//!   jittered back-off
//! - Non-success statuses and malformed bodies fail immediately
//! - Everything surfaces as `WeatherError::Unavailable`
//!
//! The credential travels in the query string, so transport errors are
//! stripped of their URL before they are logged or returned.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::source::WeatherSource;
use crate::types::{MAX_TRANSIENT_RETRIES, WeatherConfig, WeatherObservation};
use crate::WeatherError;

/// Longest provider error body echoed back in a failure reason
const MAX_ERROR_BODY: usize = 200;

/// Current-weather response, reduced to the fields we read.
///
/// Everything is optional so a missing field can be named precisely.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    name: Option<String>,
    main: Option<ProviderMain>,
    #[serde(default)]
    weather: Vec<ProviderCondition>,
}

#[derive(Debug, Deserialize)]
struct ProviderMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProviderCondition {
    description: Option<String>,
}

impl ProviderResponse {
    fn into_observation(self, requested: &str) -> Result<WeatherObservation, String> {
        let main = self.main.ok_or("missing field 'main'")?;
        let temperature = main.temp.ok_or("missing field 'main.temp'")?;
        let humidity = main.humidity.ok_or("missing field 'main.humidity'")?;
        let description = self
            .weather
            .into_iter()
            .next()
            .and_then(|condition| condition.description)
            .ok_or("missing field 'weather[0].description'")?;

        if !temperature.is_finite() {
            return Err(format!("invalid temperature {}", temperature));
        }
        if !humidity.is_finite() || !(0.0..=100.0).contains(&humidity) {
            return Err(format!("humidity {} outside 0-100", humidity));
        }

        let location = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| requested.to_string());

        Ok(WeatherObservation {
            location,
            temperature,
            humidity,
            description,
        })
    }
}

/// Outcome of one failed attempt
#[derive(Debug)]
enum AttemptError {
    /// Worth one more try (timeout, connection failure)
    Transient(String),
    /// Retrying would not help
    Fatal(String),
}

/// HTTP client for the live weather provider.
///
/// Cheap to clone: `reqwest::Client` is reference-counted internally.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherClient {
    /// Build a client whose every request is bounded by `config.timeout`
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                WeatherError::unavailable(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self { http, config })
    }

    /// Settings this client was built with
    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Fetch current conditions for `location`.
    ///
    /// At most `1 + max_retries` attempts; only transient failures retry.
    #[instrument(skip(self))]
    pub async fn fetch(&self, location: &str) -> Result<WeatherObservation, WeatherError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(WeatherError::unavailable("location is empty"));
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| WeatherError::unavailable("no weather API key configured"))?;

        let max_retries = self.config.max_retries.min(MAX_TRANSIENT_RETRIES);
        let mut attempt = 0;
        loop {
            match self.request_once(location, api_key).await {
                Ok(observation) => {
                    debug!(
                        "Weather for {}: {:.1}°C, {:.0}% humidity, {}",
                        observation.location,
                        observation.temperature,
                        observation.humidity,
                        observation.description
                    );
                    return Ok(observation);
                }
                Err(AttemptError::Transient(reason)) if attempt < max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay();
                    warn!(
                        "Transient weather failure for {} ({}), retrying in {:?}",
                        location, reason, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(AttemptError::Transient(reason)) | Err(AttemptError::Fatal(reason)) => {
                    warn!("Weather unavailable for {}: {}", location, reason);
                    return Err(WeatherError::unavailable(reason));
                }
            }
        }
    }

    async fn request_once(
        &self,
        location: &str,
        api_key: &str,
    ) -> Result<WeatherObservation, AttemptError> {
        let url = format!("{}/weather", self.config.base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(AttemptError::Fatal(format!(
                "provider returned {} for '{}': {}",
                status,
                location,
                body.trim()
            )));
        }

        let body: ProviderResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                AttemptError::Fatal(format!("malformed provider response: {}", e.without_url()))
            }
        })?;

        body.into_observation(location).map_err(AttemptError::Fatal)
    }

    /// Sort a transport error into transient or fatal
    fn classify(&self, e: reqwest::Error) -> AttemptError {
        if e.is_timeout() {
            AttemptError::Transient(format!(
                "request to weather provider timed out after {:?}",
                self.config.timeout
            ))
        } else if e.is_connect() {
            AttemptError::Transient(format!(
                "could not connect to weather provider: {}",
                e.without_url()
            ))
        } else {
            AttemptError::Fatal(format!("weather request failed: {}", e.without_url()))
        }
    }

    /// Back-off plus a random share of the configured jitter
    fn retry_delay(&self) -> Duration {
        let jitter_ms = self.config.retry_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::random_range(0..=jitter_ms)
        };
        self.config.retry_backoff + Duration::from_millis(jitter)
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    fn name(&self) -> &str {
        "openweathermap"
    }

    async fn fetch(&self, location: &str) -> Result<WeatherObservation, WeatherError> {
        WeatherClient::fetch(self, location).await
    }
}
