//! Rule checking soil pH against the optimal band.

use crate::traits::ExplanationRule;
use data_loader::{Feature, FeatureStatistics};

/// Lower edge of the optimal pH band (inclusive)
pub const OPTIMAL_PH_MIN: f64 = 5.5;

/// Upper edge of the optimal pH band (inclusive)
pub const OPTIMAL_PH_MAX: f64 = 7.5;

const OPTIMAL_SENTENCE: &str = "Soil pH is in the optimal range for most crops.";
const NOT_IDEAL_SENTENCE: &str = "Soil pH is not ideal and may limit nutrient uptake.";

/// Explains pH by whether it lies in `[min, max]`.
///
/// Unlike the mean comparisons, this ignores historical statistics: the band
/// is agronomic, not learned from the dataset.
pub struct AcidityBandRule {
    min: f64,
    max: f64,
}

impl AcidityBandRule {
    /// Create a rule with a custom band.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `ph` falls inside the band, edges included
    pub fn is_optimal(&self, ph: f64) -> bool {
        (self.min..=self.max).contains(&ph)
    }
}

impl Default for AcidityBandRule {
    fn default() -> Self {
        Self::new(OPTIMAL_PH_MIN, OPTIMAL_PH_MAX)
    }
}

impl ExplanationRule for AcidityBandRule {
    fn name(&self) -> &str {
        "AcidityBandRule"
    }

    fn applies_to(&self, feature: Feature) -> bool {
        feature == Feature::Ph
    }

    fn explain(&self, _feature: Feature, observed: f64, _stats: &FeatureStatistics) -> String {
        if self.is_optimal(observed) {
            OPTIMAL_SENTENCE.to_string()
        } else {
            NOT_IDEAL_SENTENCE.to_string()
        }
    }
}
