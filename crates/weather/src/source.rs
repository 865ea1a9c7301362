//! The seam between the orchestrator and any live weather provider.

use async_trait::async_trait;

use crate::types::WeatherObservation;
use crate::WeatherError;

/// Anything that can report current conditions for a named location.
///
/// `Send + Sync` so one source can be shared by concurrent requests.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Returns the name of this source (for logging/debugging)
    fn name(&self) -> &str;

    /// Fetch the current observation for `location`.
    ///
    /// Every failure mode collapses into `WeatherError::Unavailable`.
    async fn fetch(&self, location: &str) -> Result<WeatherObservation, WeatherError>;
}
