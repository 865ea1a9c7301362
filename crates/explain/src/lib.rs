//! Explanations for crop recommendations.
//!
//! This crate provides:
//! - ExplanationRule trait and the rules of the standard policy
//! - FeatureExplainer for ranking features and composing rules
//!
//! ## Architecture
//! Explanations are produced in stages:
//! 1. Features are ranked by the classifier's static importance weights
//! 2. The top-k features are kept (k = 3 in the engine)
//! 3. The first rule covering each feature turns its observed value into
//!    a sentence, using historical means where the rule needs them
//!
//! ## Example Usage
//! ```ignore
//! use explain::{FeatureExplainer, DEFAULT_TOP_K};
//!
//! let explainer = FeatureExplainer::standard();
//! let factors = explainer.explain(
//!     classifier.feature_importances(),
//!     &vector,
//!     &stats,
//!     DEFAULT_TOP_K,
//! );
//! ```

pub mod traits;
pub mod rules;
pub mod explainer;

// Re-export main types
pub use traits::ExplanationRule;
pub use explainer::{DEFAULT_TOP_K, FeatureExplainer, rank_features};
