//! Core domain types for crop recommendation.
//!
//! The seven agronomic features are modelled as a closed enum so every
//! lookup is an exhaustive `match` instead of a name-based search.
//! Key points:
//! - `Feature` declaration order IS the order the classifier was trained on
//! - `FeatureVector` can only be read through a `Feature`
//! - `FeatureImportance` validates its weights once, at construction

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DataLoadError, Result};

/// Version of the feature-order contract shared with the training job.
///
/// Bump this whenever `Feature::ALL` changes; artifacts exported for a
/// different version are rejected at load time.
pub const FEATURE_ORDER_VERSION: u32 = 1;

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 7;

/// Tolerance used when checking that importance weights sum to 1.
const IMPORTANCE_SUM_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Feature
// =============================================================================

/// One input variable of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    /// All features in canonical (training) order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
    ];

    /// Position of this feature in the classifier's input vector
    pub fn index(self) -> usize {
        match self {
            Feature::Nitrogen => 0,
            Feature::Phosphorus => 1,
            Feature::Potassium => 2,
            Feature::Temperature => 3,
            Feature::Humidity => 4,
            Feature::Ph => 5,
            Feature::Rainfall => 6,
        }
    }

    /// Human-readable name used in explanations
    pub fn display_name(self) -> &'static str {
        match self {
            Feature::Nitrogen => "Nitrogen",
            Feature::Phosphorus => "Phosphorus",
            Feature::Potassium => "Potassium",
            Feature::Temperature => "Temperature",
            Feature::Humidity => "Humidity",
            Feature::Ph => "pH",
            Feature::Rainfall => "Rainfall",
        }
    }

    /// Column name in the reference dataset and the model artifact
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::Nitrogen => "N",
            Feature::Phosphorus => "P",
            Feature::Potassium => "K",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
        }
    }

    /// Resolve a feature from either its column name or display name.
    ///
    /// Matching is case-insensitive, so "N", "nitrogen" and "Nitrogen"
    /// all resolve to `Feature::Nitrogen`.
    pub fn from_name(name: &str) -> Option<Feature> {
        let name = name.trim();
        Feature::ALL.into_iter().find(|feature| {
            feature.column_name().eq_ignore_ascii_case(name)
                || feature.display_name().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// =============================================================================
// FeatureVector
// =============================================================================

/// The classifier input: seven reals in canonical order.
///
/// Rust concept: the array is private, so callers cannot build a vector
/// with the wrong length or read a slot by a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build a vector from named components.
    pub fn new(
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    ) -> Self {
        Self {
            values: [nitrogen, phosphorus, potassium, temperature, humidity, ph, rainfall],
        }
    }

    /// Observed value for one feature
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Raw values in canonical order, ready for inference
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

// =============================================================================
// FeatureImportance
// =============================================================================

/// Static per-feature weights reported by the trained classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    weights: [f64; FEATURE_COUNT],
}

impl FeatureImportance {
    /// Validate and wrap weights given in canonical order.
    ///
    /// Weights must be finite, non-negative and sum to 1.
    pub fn from_weights(weights: &[f64]) -> Result<Self> {
        let weights: [f64; FEATURE_COUNT] = weights.try_into().map_err(|_| {
            DataLoadError::ValidationError(format!(
                "expected {} importance weights, got {}",
                FEATURE_COUNT,
                weights.len()
            ))
        })?;

        for (feature, &weight) in Feature::ALL.iter().zip(weights.iter()) {
            if !weight.is_finite() || weight < 0.0 {
                return Err(DataLoadError::InvalidValue {
                    field: format!("importance of {}", feature),
                    value: weight.to_string(),
                });
            }
        }

        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > IMPORTANCE_SUM_TOLERANCE {
            return Err(DataLoadError::ValidationError(format!(
                "importance weights sum to {}, expected 1",
                total
            )));
        }

        Ok(Self { weights })
    }

    /// Weight assigned to one feature
    pub fn weight(&self, feature: Feature) -> f64 {
        self.weights[feature.index()]
    }

    /// (feature, weight) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().map(|feature| (feature, self.weight(feature)))
    }
}

// =============================================================================
// Reference dataset
// =============================================================================

/// One row of the reference dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub features: FeatureVector,
    /// Crop label, when the dataset carries a `label` column
    pub label: Option<String>,
}
