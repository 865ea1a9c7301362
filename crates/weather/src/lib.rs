//! # Weather Crate
//!
//! Live weather for the recommendation engine.
//!
//! ## Components
//!
//! ### WeatherSource
//! The async trait the orchestrator depends on. Tests swap in fakes.
//!
//! ### WeatherClient
//! OpenWeatherMap implementation built on `reqwest`:
//! - One bounded request per attempt (`WeatherConfig::timeout`)
//! - A single jittered retry for timeouts and connection failures
//! - No caching; every call asks the provider again
//!
//! ## Example Usage
//!
//! ```ignore
//! use weather::{WeatherClient, WeatherConfig};
//!
//! let config = WeatherConfig::default().with_api_key(api_key);
//! let client = WeatherClient::new(config)?;
//! let observation = client.fetch("Nashik").await?;
//! println!("{:.1}°C, {}", observation.temperature, observation.description);
//! ```

use thiserror::Error;

// Public modules
pub mod types;
pub mod source;
pub mod client;

// Re-export commonly used types
pub use client::WeatherClient;
pub use source::WeatherSource;
pub use types::{DEFAULT_BASE_URL, MAX_TRANSIENT_RETRIES, WeatherConfig, WeatherObservation};

/// The single failure type of the weather layer.
///
/// Transport problems, provider errors and malformed responses all end up
/// here; callers only need to know the observation is unavailable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error("Weather unavailable: {reason}")]
    Unavailable { reason: String },
}

impl WeatherError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        WeatherError::Unavailable {
            reason: reason.into(),
        }
    }
}
