//! Rule comparing an observed value with its historical mean.
//!
//! Each covered feature has two fixed sentences: one for a value above the
//! mean and one for a value at or below it.

use crate::rules::generic::generic_sentence;
use crate::traits::ExplanationRule;
use data_loader::{Feature, FeatureStatistics};

/// The pair of sentences used for one feature
#[derive(Debug, Clone, Copy)]
pub struct MeanSentences {
    pub feature: Feature,
    /// Used when observed > mean
    pub above: &'static str,
    /// Used when observed <= mean
    pub at_or_below: &'static str,
}

const STANDARD_SENTENCES: [MeanSentences; 3] = [
    MeanSentences {
        feature: Feature::Rainfall,
        above: "High rainfall supports water-intensive crops.",
        at_or_below: "Lower rainfall favors drought-tolerant crops.",
    },
    MeanSentences {
        feature: Feature::Temperature,
        above: "Warm temperatures favor heat-loving crops.",
        at_or_below: "Cooler temperatures suit temperate crops.",
    },
    MeanSentences {
        feature: Feature::Nitrogen,
        above: "High nitrogen levels promote vigorous leafy growth.",
        at_or_below: "Lower nitrogen levels suit legumes and light feeders.",
    },
];

/// Explains a feature by whether it exceeds the historical mean.
///
/// ## Algorithm
/// 1. Look up the feature's historical mean in `FeatureStatistics`
/// 2. Strictly greater than the mean: the "above" sentence
/// 3. Otherwise (including equality): the "at or below" sentence
pub struct MeanComparisonRule {
    sentences: Vec<MeanSentences>,
}

impl MeanComparisonRule {
    /// Rainfall, Temperature and Nitrogen with the fixed sentences
    pub fn standard() -> Self {
        Self::new(STANDARD_SENTENCES.to_vec())
    }

    /// Create a rule from an explicit sentence table.
    pub fn new(sentences: Vec<MeanSentences>) -> Self {
        Self { sentences }
    }

    fn sentences_for(&self, feature: Feature) -> Option<&MeanSentences> {
        self.sentences.iter().find(|s| s.feature == feature)
    }
}

impl ExplanationRule for MeanComparisonRule {
    fn name(&self) -> &str {
        "MeanComparisonRule"
    }

    fn applies_to(&self, feature: Feature) -> bool {
        self.sentences_for(feature).is_some()
    }

    fn explain(&self, feature: Feature, observed: f64, stats: &FeatureStatistics) -> String {
        match self.sentences_for(feature) {
            Some(sentences) if observed > stats.mean(feature) => sentences.above.to_string(),
            Some(sentences) => sentences.at_or_below.to_string(),
            None => generic_sentence(feature),
        }
    }
}
