//! Core trait for explanation rules.
//!
//! A rule turns one observed feature value into a sentence. Rules are
//! composed in a `FeatureExplainer`, which asks each rule in turn whether it
//! covers a feature.

use data_loader::{Feature, FeatureStatistics};

/// One row of the explanation policy.
///
/// ## Design Note
/// - `Send + Sync` so the explainer can be shared across requests
/// - Rules are pure: the same inputs always give the same sentence
pub trait ExplanationRule: Send + Sync {
    /// Returns the name of this rule (for logging/debugging)
    fn name(&self) -> &str;

    /// Whether this rule has something to say about `feature`
    fn applies_to(&self, feature: Feature) -> bool;

    /// Sentence for the observed value of `feature`.
    ///
    /// Only called when `applies_to(feature)` is true.
    fn explain(&self, feature: Feature, observed: f64, stats: &FeatureStatistics) -> String;
}
