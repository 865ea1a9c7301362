//! Rule implementations for the explanation policy.
//!
//! The standard policy is closed and fixed:
//! - Rainfall, Temperature, Nitrogen: compare with the historical mean
//! - pH: inside or outside the 5.5-7.5 band
//! - everything else: a generic sentence naming the feature

pub mod acidity_band;
pub mod generic;
pub mod mean_comparison;

// Re-export for convenience
pub use acidity_band::AcidityBandRule;
pub use generic::GenericRule;
pub use mean_comparison::MeanComparisonRule;
