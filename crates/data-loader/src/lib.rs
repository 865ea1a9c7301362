//! # Data Loader Crate
//!
//! This crate owns the agronomic domain types and the reference dataset
//! used to compute historical feature statistics.
//!
//! ## Main Components
//!
//! - **types**: `Feature`, `FeatureVector`, `FeatureImportance`
//! - **parser**: Parse the reference CSV into records
//! - **stats**: `FeatureStatistics`, the per-feature historical means
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Feature, FeatureStatistics};
//! use std::path::Path;
//!
//! let stats = FeatureStatistics::load_from_file(Path::new("data/crop_data.csv"))?;
//! println!("Average rainfall: {:.1} mm", stats.mean(Feature::Rainfall));
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod stats;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use stats::FeatureStatistics;
pub use types::{
    // Constants
    FEATURE_COUNT,
    FEATURE_ORDER_VERSION,
    // Core types
    Feature,
    FeatureImportance,
    FeatureVector,
    ReferenceRecord,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_load_bundled_dataset() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/crop_data.csv");

        let stats = FeatureStatistics::load_from_file(&path).unwrap();

        assert_eq!(stats.record_count(), 9);
        assert!(stats.labels().contains("rice"));
        assert!(stats.labels().contains("maize"));
        assert!(stats.labels().contains("chickpea"));
        approx::assert_relative_eq!(stats.mean(Feature::Nitrogen), 605.0 / 9.0, epsilon = 1e-9);
        approx::assert_relative_eq!(stats.mean(Feature::Temperature), 195.0 / 9.0, epsilon = 1e-9);
        approx::assert_relative_eq!(stats.mean(Feature::Rainfall), 1140.0 / 9.0, epsilon = 1e-9);
        approx::assert_relative_eq!(stats.mean(Feature::Humidity), 484.0 / 9.0, epsilon = 1e-9);
    }
}
