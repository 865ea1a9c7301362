//! # Recommendation Orchestrator
//!
//! This module coordinates one recommendation request:
//! 1. Validate the inbound query (`handle` only)
//! 2. Fetch live weather, or fall back to manual conditions
//! 3. Assemble the feature vector in canonical order
//! 4. Run classifier inference (on the blocking pool)
//! 5. Rank feature importances and synthesize explanations
//! 6. Return the structured result
//!
//! A weather failure stops the request before inference. The orchestrator
//! never retries; the weather client owns the single bounded retry.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use classifier::{ClassifierError, Prediction};
use data_loader::{Feature, FeatureVector};
use explain::DEFAULT_TOP_K;
use weather::WeatherObservation;

use crate::context::EngineContext;
use crate::error::RecommendError;
use crate::query::{CropQuery, QueryInput, ValidationError};

/// Fixed guidance attached to every recommendation
pub const ADVISORY: &str = "Suitable for warm climate with sufficient rainfall.";

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    /// Predicted crop, capitalized ("Rice")
    pub crop: String,
    /// Probability of the predicted crop, rounded to 3 decimals
    pub confidence: f64,
    pub advisory: String,
    /// At most three sentences, most important factor first
    pub top_factors: Vec<String>,
    /// The live observation used, when live weather was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherObservation>,
}

impl RecommendationResult {
    fn new(
        prediction: &Prediction,
        top_factors: Vec<String>,
        weather: Option<WeatherObservation>,
    ) -> Self {
        Self {
            crop: prediction.display_name(),
            confidence: prediction.confidence,
            advisory: ADVISORY.to_string(),
            top_factors,
            weather,
        }
    }
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone, Debug)]
pub struct RecommendationOrchestrator {
    context: EngineContext,
}

impl RecommendationOrchestrator {
    pub fn new(context: EngineContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Validate a raw query, then recommend.
    ///
    /// Validation failures are returned before any weather call or
    /// inference.
    pub async fn handle(
        &self,
        input: QueryInput,
        use_live_weather: bool,
    ) -> Result<RecommendationResult, RecommendError> {
        let query = CropQuery::try_from(input).inspect_err(|e| {
            info!("Rejected query: {}", e);
        })?;
        self.recommend(&query, use_live_weather).await
    }

    /// Main entry point: recommend one crop for a validated query.
    ///
    /// # Arguments
    /// * `query` - Soil readings and location
    /// * `use_live_weather` - Fetch temperature/humidity from the provider
    ///   instead of using the query's manual values
    #[instrument(skip(self, query), fields(location = %query.location()))]
    pub async fn recommend(
        &self,
        query: &CropQuery,
        use_live_weather: bool,
    ) -> Result<RecommendationResult, RecommendError> {
        let start_time = Instant::now();
        info!("Recommendation requested (live weather: {})", use_live_weather);

        let observation = if use_live_weather {
            Some(self.fetch_weather(query.location()).await?)
        } else {
            None
        };

        let vector = self.build_feature_vector(query, observation.as_ref())?;
        debug!("Feature vector: {:?}", vector.as_array());

        let prediction = self.infer(vector).await?;
        info!("Predicted {}", prediction);

        let top_factors = self.context.explainer.explain(
            self.context.classifier.feature_importances(),
            &vector,
            &self.context.stats,
            DEFAULT_TOP_K,
        );
        debug!("Explained {} factors", top_factors.len());

        let result = RecommendationResult::new(&prediction, top_factors, observation);

        info!(
            "Recommendation for {} complete in {:.2?}",
            query.location(),
            start_time.elapsed()
        );
        Ok(result)
    }

    /// Fetch live conditions. Failures propagate unchanged.
    async fn fetch_weather(&self, location: &str) -> Result<WeatherObservation, RecommendError> {
        match self.context.weather.fetch(location).await {
            Ok(observation) => {
                info!(
                    "Weather for {}: {:.1}°C, {:.0}% humidity, {}",
                    observation.location,
                    observation.temperature,
                    observation.humidity,
                    observation.description
                );
                Ok(observation)
            }
            Err(e) => {
                warn!("Weather lookup via {} failed: {}", self.context.weather.name(), e);
                Err(e.into())
            }
        }
    }

    /// Assemble the classifier input in canonical order.
    ///
    /// Live observations supply temperature and humidity. Otherwise the
    /// query's manual temperature is used and humidity defaults to the
    /// historical mean.
    pub fn build_feature_vector(
        &self,
        query: &CropQuery,
        observation: Option<&WeatherObservation>,
    ) -> Result<FeatureVector, ValidationError> {
        let (temperature, humidity) = match observation {
            Some(obs) => (obs.temperature, obs.humidity),
            None => {
                let temperature = query.temperature().ok_or_else(|| {
                    ValidationError::for_field(
                        "temperature",
                        "is required when live weather is not used",
                    )
                })?;
                let humidity = query
                    .humidity()
                    .unwrap_or_else(|| self.context.stats.mean(Feature::Humidity));
                (temperature, humidity)
            }
        };

        Ok(FeatureVector::new(
            query.nitrogen(),
            query.phosphorus(),
            query.potassium(),
            temperature,
            humidity,
            query.ph(),
            query.rainfall(),
        ))
    }

    /// Run inference on the blocking pool
    async fn infer(&self, vector: FeatureVector) -> Result<Prediction, RecommendError> {
        let classifier = self.context.classifier.clone();
        let prediction = tokio::task::spawn_blocking(move || classifier.infer(&vector))
            .await
            .map_err(|e| ClassifierError::InvalidOutput(format!("inference task failed: {}", e)))??;
        Ok(prediction)
    }
}
