//! Core trait for probability-producing classifiers.

use data_loader::FEATURE_COUNT;

/// A classifier that maps a feature vector to a class distribution.
///
/// ## Design Note
/// - `Send + Sync` lets one loaded model serve concurrent requests
/// - The output has one entry per class, in the artifact's class order
pub trait ProbabilisticModel: Send + Sync {
    /// Returns the model family name (for logging/debugging)
    fn name(&self) -> &str;

    /// Number of classes in the output distribution
    fn n_classes(&self) -> usize;

    /// Class probabilities for a single feature vector in canonical order
    fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> Vec<f64>;
}
