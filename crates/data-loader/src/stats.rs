//! Historical feature statistics.
//!
//! Per-feature means are computed once from the reference dataset and are
//! read-only afterwards, so the table can be shared across threads behind
//! an `Arc` without locking.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Historical per-feature means computed from the reference dataset
#[derive(Debug, Clone)]
pub struct FeatureStatistics {
    means: [f64; FEATURE_COUNT],
    record_count: usize,
    labels: BTreeSet<String>,
}

impl FeatureStatistics {
    /// Load the reference dataset and compute its statistics.
    ///
    /// This is the main entry point at startup.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading reference dataset from {:?}", path);

        let records = parser::parse_reference_dataset(path)?;
        let stats = Self::from_records(&records)?;

        info!(
            "Computed feature statistics from {} records ({} crop labels)",
            stats.record_count,
            stats.labels.len()
        );
        Ok(stats)
    }

    /// Compute statistics from already-parsed records
    pub fn from_records(records: &[ReferenceRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(DataLoadError::ValidationError(
                "cannot compute statistics from an empty dataset".to_string(),
            ));
        }

        let count = records.len() as f64;

        // One column per task; each column sums in row order, so the
        // result does not depend on scheduling.
        let column_means: Vec<f64> = Feature::ALL
            .par_iter()
            .map(|&feature| {
                let total: f64 = records.iter().map(|r| r.features.get(feature)).sum();
                total / count
            })
            .collect();

        let mut means = [0.0f64; FEATURE_COUNT];
        means.copy_from_slice(&column_means);

        let labels = records
            .iter()
            .filter_map(|r| r.label.clone())
            .collect();

        Ok(Self {
            means,
            record_count: records.len(),
            labels,
        })
    }

    /// Historical mean of a feature
    pub fn mean(&self, feature: Feature) -> f64 {
        self.means[feature.index()]
    }

    /// Historical mean looked up by column or display name
    pub fn mean_of(&self, name: &str) -> Result<f64> {
        Feature::from_name(name)
            .map(|feature| self.mean(feature))
            .ok_or_else(|| DataLoadError::UnknownFeature {
                name: name.to_string(),
            })
    }

    /// (feature, mean) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().map(|feature| (feature, self.mean(feature)))
    }

    /// Number of records the statistics were computed from
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Crop labels present in the reference dataset
    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(values: [f64; FEATURE_COUNT], label: &str) -> ReferenceRecord {
        let [n, p, k, t, h, ph, r] = values;
        ReferenceRecord {
            features: FeatureVector::new(n, p, k, t, h, ph, r),
            label: Some(label.to_string()),
        }
    }

    #[test]
    fn test_means_per_column() {
        let records = vec![
            record([80.0, 40.0, 40.0, 20.0, 80.0, 6.0, 200.0], "rice"),
            record([40.0, 60.0, 80.0, 18.0, 20.0, 7.0, 80.0], "chickpea"),
        ];
        let stats = FeatureStatistics::from_records(&records).unwrap();

        assert_relative_eq!(stats.mean(Feature::Nitrogen), 60.0);
        assert_relative_eq!(stats.mean(Feature::Ph), 6.5);
        assert_relative_eq!(stats.mean(Feature::Rainfall), 140.0);
        assert_eq!(stats.record_count(), 2);
        assert_eq!(stats.labels().len(), 2);
    }

    #[test]
    fn test_mean_of_by_name() {
        let records = vec![record([10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], "rice")];
        let stats = FeatureStatistics::from_records(&records).unwrap();

        assert_relative_eq!(stats.mean_of("N").unwrap(), 10.0);
        assert_relative_eq!(stats.mean_of("Nitrogen").unwrap(), 10.0);
        assert!(matches!(
            stats.mean_of("sunshine"),
            Err(DataLoadError::UnknownFeature { .. })
        ));
    }

    #[test]
    fn test_empty_records_rejected() {
        assert!(FeatureStatistics::from_records(&[]).is_err());
    }
}
