//! Fallback rule: a templated sentence naming the feature.

use crate::traits::ExplanationRule;
use data_loader::{Feature, FeatureStatistics};

/// "{Feature} levels influenced this recommendation."
pub fn generic_sentence(feature: Feature) -> String {
    format!("{} levels influenced this recommendation.", feature.display_name())
}

/// Covers every feature. Register it last so specific rules win.
pub struct GenericRule;

impl ExplanationRule for GenericRule {
    fn name(&self) -> &str {
        "GenericRule"
    }

    fn applies_to(&self, _feature: Feature) -> bool {
        true
    }

    fn explain(&self, feature: Feature, _observed: f64, _stats: &FeatureStatistics) -> String {
        generic_sentence(feature)
    }
}
