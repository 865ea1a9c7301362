//! Crop classifier adapter.
//!
//! This crate wraps the pre-trained crop classifier and exposes:
//! - Class-probability inference over a `FeatureVector`
//! - Top-1 prediction with a rounded confidence
//! - The model's static feature-importance weights and class labels
//!
//! The model is loaded once at startup from a JSON artifact. A load failure
//! is fatal: the process must not serve requests without a model.

pub mod forest;
pub mod model;

use std::fmt;
use std::path::Path;

use data_loader::{FEATURE_COUNT, FeatureImportance, FeatureVector};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

pub use forest::RandomForest;
pub use model::ProbabilisticModel;

/// Errors that can occur when loading or querying the classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model unavailable ({path}): {reason}")]
    ModelUnavailable { path: String, reason: String },

    #[error("Invalid output from model: {0}")]
    InvalidOutput(String),
}

/// Top-1 class and its probability mass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Class label exactly as it appears in the artifact
    pub label: String,
    /// Probability of the selected class, rounded to 3 decimals
    pub confidence: f64,
}

impl Prediction {
    /// Label with its first letter upper-cased ("rice" -> "Rice")
    pub fn display_name(&self) -> String {
        let mut chars = self.label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3})", self.display_name(), self.confidence)
    }
}

/// One entry of the labelled class distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Round a probability to 3 decimals, ties to even.
///
/// 0.0625 becomes 0.062 and 0.0635 becomes 0.064. Inputs are clamped to
/// [0, 1] first.
pub fn round_confidence(probability: f64) -> f64 {
    (probability.clamp(0.0, 1.0) * 1000.0).round_ties_even() / 1000.0
}

/// The classifier adapter.
///
/// Holds the probability model together with the metadata that travels
/// with the artifact: class labels and feature importances. Everything is
/// immutable after construction, so one instance can be shared via `Arc`.
pub struct CropClassifier {
    model: Box<dyn ProbabilisticModel>,
    classes: Vec<String>,
    importances: FeatureImportance,
    source: String,
}

impl CropClassifier {
    /// Load the classifier from a JSON artifact on disk.
    ///
    /// Any problem (missing file, malformed JSON, schema or feature-order
    /// mismatch) is reported as `ModelUnavailable`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        info!("Loading classifier artifact from {:?}", path);

        let json = std::fs::read_to_string(path).map_err(|e| {
            error!("Failed to read model artifact {:?}: {}", path, e);
            ClassifierError::ModelUnavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        Self::from_json_str(&json, path.display().to_string())
    }

    /// Load the classifier from an in-memory JSON artifact.
    ///
    /// `source` names where the artifact came from, for errors and logs.
    pub fn from_json_str(json: &str, source: impl Into<String>) -> Result<Self, ClassifierError> {
        let source = source.into();
        let loaded = forest::ForestArtifact::load(json).map_err(|reason| {
            error!("Rejected model artifact {}: {}", source, reason);
            ClassifierError::ModelUnavailable {
                path: source.clone(),
                reason,
            }
        })?;

        info!(
            "Loaded {}-tree forest with {} classes from {}",
            loaded.forest.n_trees(),
            loaded.classes.len(),
            source
        );

        Self::new(loaded.forest, loaded.classes, loaded.importances, source)
    }

    /// Wrap any probability model with its labels and importances.
    pub fn new(
        model: impl ProbabilisticModel + 'static,
        classes: Vec<String>,
        importances: FeatureImportance,
        source: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        let source = source.into();
        if classes.is_empty() || model.n_classes() != classes.len() {
            return Err(ClassifierError::ModelUnavailable {
                path: source,
                reason: format!(
                    "model produces {} classes but {} labels were given",
                    model.n_classes(),
                    classes.len()
                ),
            });
        }

        Ok(Self {
            model: Box::new(model),
            classes,
            importances,
            source,
        })
    }

    /// Raw class distribution for values in canonical order.
    ///
    /// Prefer `probabilities`/`infer`; this exists for callers that need to
    /// reason about vector order itself.
    pub fn predict_proba_raw(&self, values: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        self.model.predict_proba(values)
    }

    /// Full labelled class distribution for a feature vector
    pub fn probabilities(&self, vector: &FeatureVector) -> Vec<ClassProbability> {
        self.classes
            .iter()
            .zip(self.predict_proba_raw(vector.as_array()))
            .map(|(label, probability)| ClassProbability {
                label: label.clone(),
                probability,
            })
            .collect()
    }

    /// Select the most probable class.
    ///
    /// Ties resolve to the class listed first in the artifact.
    pub fn infer(&self, vector: &FeatureVector) -> Result<Prediction, ClassifierError> {
        let probabilities = self.predict_proba_raw(vector.as_array());

        if probabilities.len() != self.classes.len() {
            return Err(ClassifierError::InvalidOutput(format!(
                "expected {} probabilities, got {}",
                self.classes.len(),
                probabilities.len()
            )));
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, &p) in probabilities.iter().enumerate() {
            if !p.is_finite() {
                return Err(ClassifierError::InvalidOutput(format!(
                    "non-finite probability for class '{}'",
                    self.classes[idx]
                )));
            }
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((idx, p)),
            }
        }

        let (idx, probability) = best.ok_or_else(|| {
            ClassifierError::InvalidOutput("empty probability distribution".to_string())
        })?;

        let prediction = Prediction {
            label: self.classes[idx].clone(),
            confidence: round_confidence(probability),
        };
        debug!("{} predicted {}", self.model.name(), prediction);
        Ok(prediction)
    }

    /// Static per-feature importance weights of the loaded model
    pub fn feature_importances(&self) -> &FeatureImportance {
        &self.importances
    }

    /// Class labels in the artifact's order
    pub fn class_labels(&self) -> &[String] {
        &self.classes
    }

    /// Where the model was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for CropClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CropClassifier")
            .field("model", &self.model.name())
            .field("classes", &self.classes)
            .field("source", &self.source)
            .finish()
    }
}
