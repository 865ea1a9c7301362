//! Request-level failures of the recommendation engine.

use classifier::ClassifierError;
use thiserror::Error;
use weather::WeatherError;

use crate::query::ValidationError;

/// Everything `recommend`/`handle` can fail with.
///
/// Startup failures (model or dataset missing) are not here: they abort
/// `EngineContext::load` before any request is served.
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    WeatherUnavailable(#[from] WeatherError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ClassifierError),
}

impl RecommendError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RecommendError::Validation(_) => "validation_error",
            RecommendError::WeatherUnavailable(_) => "weather_unavailable",
            RecommendError::Inference(_) => "inference_error",
        }
    }

    /// HTTP-equivalent status
    pub fn status(&self) -> u16 {
        match self {
            RecommendError::Validation(_) => 422,
            RecommendError::WeatherUnavailable(_) => 400,
            RecommendError::Inference(_) => 500,
        }
    }
}
