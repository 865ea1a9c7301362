//! The FeatureExplainer ranks features and applies explanation rules.
//!
//! This module provides the main FeatureExplainer struct that chains
//! explanation rules together using the builder pattern.

use crate::rules::{AcidityBandRule, GenericRule, MeanComparisonRule};
use crate::traits::ExplanationRule;
use data_loader::{Feature, FeatureImportance, FeatureStatistics, FeatureVector};
use std::cmp::Ordering;

/// Number of factors the engine explains per recommendation
pub const DEFAULT_TOP_K: usize = 3;

/// Order features by importance, highest first.
///
/// Exactly equal weights keep canonical feature order (the sort is stable
/// and the input is already canonical).
pub fn rank_features(importances: &FeatureImportance) -> Vec<(Feature, f64)> {
    let mut ranked: Vec<(Feature, f64)> = importances.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}

/// Chains explanation rules into a policy.
///
/// ## Usage
/// ```ignore
/// let explainer = FeatureExplainer::standard();
/// let factors = explainer.explain(&importances, &observed, &stats, 3);
/// ```
pub struct FeatureExplainer {
    rules: Vec<Box<dyn ExplanationRule>>,
}

impl FeatureExplainer {
    /// Create a new FeatureExplainer with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The fixed policy used by the engine.
    ///
    /// Mean comparisons for Rainfall/Temperature/Nitrogen, the 5.5-7.5 band
    /// for pH, and a generic sentence for the rest.
    pub fn standard() -> Self {
        Self::new()
            .add_rule(MeanComparisonRule::standard())
            .add_rule(AcidityBandRule::default())
            .add_rule(GenericRule)
    }

    /// Add a rule (builder pattern). Earlier rules take precedence.
    pub fn add_rule(mut self, rule: impl ExplanationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Explain the `k` most important features.
    ///
    /// ## Algorithm
    /// 1. Rank features by importance (ties in canonical order)
    /// 2. Take the first `k`
    /// 3. For each, the first rule that applies produces the sentence
    ///
    /// Features no rule covers are skipped, so the result has at most `k`
    /// entries and never mentions a feature twice.
    pub fn explain(
        &self,
        importances: &FeatureImportance,
        observed: &FeatureVector,
        stats: &FeatureStatistics,
        k: usize,
    ) -> Vec<String> {
        rank_features(importances)
            .into_iter()
            .take(k)
            .filter_map(|(feature, weight)| {
                let rule = self.rules.iter().find(|rule| rule.applies_to(feature));
                match rule {
                    Some(rule) => {
                        tracing::debug!(
                            "Explaining {} (importance {:.3}) with {}",
                            feature,
                            weight,
                            rule.name()
                        );
                        Some(rule.explain(feature, observed.get(feature), stats))
                    }
                    None => {
                        tracing::debug!("No rule covers {}, skipping", feature);
                        None
                    }
                }
            })
            .collect()
    }
}

impl Default for FeatureExplainer {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::ReferenceRecord;

    fn stats() -> FeatureStatistics {
        FeatureStatistics::from_records(&[ReferenceRecord {
            features: FeatureVector::new(60.0, 50.0, 45.0, 22.0, 55.0, 6.6, 120.0),
            label: None,
        }])
        .unwrap()
    }

    fn importances(weights: &[f64]) -> FeatureImportance {
        FeatureImportance::from_weights(weights).unwrap()
    }

    #[test]
    fn test_rank_breaks_ties_by_canonical_order() {
        let ranked = rank_features(&importances(&[0.25, 0.05, 0.05, 0.2, 0.15, 0.1, 0.2]));
        let order: Vec<Feature> = ranked.iter().map(|(f, _)| *f).collect();

        assert_eq!(
            order,
            vec![
                Feature::Nitrogen,
                Feature::Temperature,
                Feature::Rainfall,
                Feature::Humidity,
                Feature::Ph,
                Feature::Phosphorus,
                Feature::Potassium,
            ]
        );
    }

    #[test]
    fn test_empty_explainer_skips_everything() {
        let explainer = FeatureExplainer::new();
        let observed = FeatureVector::new(90.0, 40.0, 40.0, 25.0, 80.0, 6.5, 200.0);

        let factors = explainer.explain(
            &importances(&[0.25, 0.05, 0.05, 0.2, 0.15, 0.1, 0.2]),
            &observed,
            &stats(),
            3,
        );
        assert!(factors.is_empty());
    }

    #[test]
    fn test_single_rule() {
        let explainer = FeatureExplainer::new().add_rule(AcidityBandRule::default());
        let observed = FeatureVector::new(90.0, 40.0, 40.0, 25.0, 80.0, 6.5, 200.0);

        // pH ranks first, the rest have no rule
        let factors = explainer.explain(
            &importances(&[0.1, 0.1, 0.1, 0.1, 0.1, 0.4, 0.1]),
            &observed,
            &stats(),
            3,
        );
        assert_eq!(factors, vec!["Soil pH is in the optimal range for most crops."]);
    }

    #[test]
    fn test_k_larger_than_feature_count() {
        let explainer = FeatureExplainer::standard();
        let observed = FeatureVector::new(90.0, 40.0, 40.0, 25.0, 80.0, 6.5, 200.0);

        let factors = explainer.explain(
            &importances(&[0.25, 0.05, 0.05, 0.2, 0.15, 0.1, 0.2]),
            &observed,
            &stats(),
            10,
        );
        assert_eq!(factors.len(), 7);
    }

    #[test]
    fn test_zero_k() {
        let explainer = FeatureExplainer::standard();
        let observed = FeatureVector::new(90.0, 40.0, 40.0, 25.0, 80.0, 6.5, 200.0);

        let factors = explainer.explain(
            &importances(&[0.25, 0.05, 0.05, 0.2, 0.15, 0.1, 0.2]),
            &observed,
            &stats(),
            0,
        );
        assert!(factors.is_empty());
    }
}
