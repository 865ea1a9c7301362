//! Immutable startup context shared by every request.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use classifier::CropClassifier;
use data_loader::FeatureStatistics;
use explain::FeatureExplainer;
use tracing::{info, warn};
use weather::{WeatherClient, WeatherSource};

use crate::config::EngineConfig;

/// Everything the orchestrator needs, built once at startup.
///
/// Cloning only bumps reference counts.
#[derive(Clone)]
pub struct EngineContext {
    pub classifier: Arc<CropClassifier>,
    pub stats: Arc<FeatureStatistics>,
    pub explainer: Arc<FeatureExplainer>,
    pub weather: Arc<dyn WeatherSource>,
}

impl EngineContext {
    /// Assemble a context from already-built parts
    pub fn new(
        classifier: CropClassifier,
        stats: FeatureStatistics,
        explainer: FeatureExplainer,
        weather: Arc<dyn WeatherSource>,
    ) -> Self {
        Self {
            classifier: Arc::new(classifier),
            stats: Arc::new(stats),
            explainer: Arc::new(explainer),
            weather,
        }
    }

    /// Load the model and reference statistics and build the weather client.
    ///
    /// Any failure here is fatal: the engine must not serve requests
    /// without a model.
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let classifier = CropClassifier::load(&config.model_path)
            .context("Failed to load crop classifier")?;

        let stats = FeatureStatistics::load_from_file(&config.dataset_path)
            .with_context(|| {
                format!("Failed to load reference dataset {:?}", config.dataset_path)
            })?;

        check_labels(&classifier, &stats);

        if config.weather.api_key.is_none() {
            warn!("WEATHER_API_KEY is not set, live weather requests will fail");
        }
        let weather = WeatherClient::new(config.weather.clone())
            .context("Failed to create weather client")?;

        info!(
            "Engine ready: {} classes, {} reference records, weather via {}",
            classifier.class_labels().len(),
            stats.record_count(),
            weather.name()
        );

        Ok(Self::new(
            classifier,
            stats,
            FeatureExplainer::standard(),
            Arc::new(weather),
        ))
    }
}

/// Warn when the model predicts classes the reference data never saw.
fn check_labels(classifier: &CropClassifier, stats: &FeatureStatistics) {
    let labels = stats.labels();
    if labels.is_empty() {
        return;
    }
    let missing: Vec<&str> = classifier
        .class_labels()
        .iter()
        .filter(|class| !labels.contains(class.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        warn!("Model classes missing from reference dataset: {}", missing.join(", "));
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("classifier", &self.classifier)
            .field("records", &self.stats.record_count())
            .field("weather", &self.weather.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn bundled(file: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data").join(file)
    }

    #[test]
    fn test_load_bundled_assets() {
        let config = EngineConfig::default()
            .with_model_path(bundled("crop_model.json"))
            .with_dataset_path(bundled("crop_data.csv"));

        let context = EngineContext::load(&config).unwrap();
        assert_eq!(context.classifier.class_labels().len(), 3);
        assert_eq!(context.stats.record_count(), 9);
        assert_eq!(context.weather.name(), "openweathermap");
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let config = EngineConfig::default()
            .with_model_path("does/not/exist.json")
            .with_dataset_path(bundled("crop_data.csv"));

        let err = EngineContext::load(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to load crop classifier"));
    }

    #[test]
    fn test_missing_dataset_is_fatal() {
        let config = EngineConfig::default()
            .with_model_path(bundled("crop_model.json"))
            .with_dataset_path("does/not/exist.csv");

        assert!(EngineContext::load(&config).is_err());
    }
}
