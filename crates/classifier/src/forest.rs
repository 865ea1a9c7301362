//! Random-forest artifact exported by the offline training job.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "model_type": "random_forest",
//!   "feature_order_version": 1,
//!   "feature_names": ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"],
//!   "classes": ["chickpea", "maize", "rice"],
//!   "feature_importances": [0.25, 0.05, 0.05, 0.2, 0.15, 0.1, 0.2],
//!   "trees": [
//!     {
//!       "children_left":  [1, -1, -1],
//!       "children_right": [2, -1, -1],
//!       "feature":        [6, -2, -2],
//!       "threshold":      [150.0, -2.0, -2.0],
//!       "value":          [[..], [..], [..]]
//!     }
//!   ]
//! }
//! ```
//!
//! Each tree uses the flat sklearn layout: node `i` is a leaf when
//! `children_left[i] == -1`, otherwise a sample goes left when
//! `x[feature[i]] <= threshold[i]`. Leaf value rows hold per-class counts
//! (or fractions); they are normalized once at load time, so prediction
//! is just a walk to the leaf.

use data_loader::{FEATURE_COUNT, FEATURE_ORDER_VERSION, Feature, FeatureImportance};
use rayon::prelude::*;
use serde::Deserialize;

use crate::model::ProbabilisticModel;

const MODEL_TYPE: &str = "random_forest";

/// Marker sklearn uses for "no child"
const LEAF_MARKER: i64 = -1;

/// JSON deserialization format for the exported forest.
#[derive(Debug, Deserialize)]
pub(crate) struct ForestArtifact {
    model_type: String,
    feature_order_version: u32,
    feature_names: Vec<String>,
    classes: Vec<String>,
    feature_importances: Vec<f64>,
    trees: Vec<TreeArtifact>,
}

/// One tree in flat array form.
#[derive(Debug, Deserialize)]
struct TreeArtifact {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

/// Everything the adapter needs from a validated artifact
pub(crate) struct LoadedForest {
    pub forest: RandomForest,
    pub classes: Vec<String>,
    pub importances: FeatureImportance,
}

impl ForestArtifact {
    /// Parse and validate an artifact, returning a human-readable reason
    /// on failure.
    pub(crate) fn load(json: &str) -> Result<LoadedForest, String> {
        let artifact: ForestArtifact =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {}", e))?;
        artifact.validate()
    }

    fn validate(self) -> Result<LoadedForest, String> {
        if self.model_type != MODEL_TYPE {
            return Err(format!(
                "Expected model_type '{}', got '{}'",
                MODEL_TYPE, self.model_type
            ));
        }

        if self.feature_order_version != FEATURE_ORDER_VERSION {
            return Err(format!(
                "Feature order version {} is not supported (expected {})",
                self.feature_order_version, FEATURE_ORDER_VERSION
            ));
        }

        // The pinned order must match exactly; a permutation would silently
        // corrupt every prediction.
        let expected: Vec<&str> = Feature::ALL.iter().map(|f| f.column_name()).collect();
        if self.feature_names != expected {
            return Err(format!(
                "Feature names {:?} do not match the pinned order {:?}",
                self.feature_names, expected
            ));
        }

        if self.classes.is_empty() {
            return Err("Artifact declares no classes".to_string());
        }

        let importances = FeatureImportance::from_weights(&self.feature_importances)
            .map_err(|e| format!("Invalid feature importances: {}", e))?;

        if self.trees.is_empty() {
            return Err("Artifact contains no trees".to_string());
        }

        let n_classes = self.classes.len();
        let trees = self
            .trees
            .into_iter()
            .enumerate()
            .map(|(idx, tree)| {
                tree.into_tree(n_classes)
                    .map_err(|reason| format!("tree[{}]: {}", idx, reason))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LoadedForest {
            forest: RandomForest { trees, n_classes },
            classes: self.classes,
            importances,
        })
    }
}

impl TreeArtifact {
    fn into_tree(self, n_classes: usize) -> Result<DecisionTree, String> {
        let n_nodes = self.children_left.len();
        if n_nodes == 0 {
            return Err("empty tree".to_string());
        }
        if self.children_right.len() != n_nodes
            || self.feature.len() != n_nodes
            || self.threshold.len() != n_nodes
            || self.value.len() != n_nodes
        {
            return Err(format!(
                "array lengths differ (children_left={}, children_right={}, feature={}, threshold={}, value={})",
                n_nodes,
                self.children_right.len(),
                self.feature.len(),
                self.threshold.len(),
                self.value.len()
            ));
        }

        let mut nodes = Vec::with_capacity(n_nodes);
        for i in 0..n_nodes {
            let left = self.children_left[i];
            let right = self.children_right[i];

            if left == LEAF_MARKER {
                if right != LEAF_MARKER {
                    return Err(format!("node {} has only one child", i));
                }
                nodes.push(Node::Leaf {
                    distribution: normalize_leaf(&self.value[i], n_classes)
                        .map_err(|reason| format!("node {}: {}", i, reason))?,
                });
                continue;
            }

            // Children must come after their parent; this also rules out cycles.
            let child = |raw: i64| -> Result<usize, String> {
                if raw <= i as i64 || raw >= n_nodes as i64 {
                    Err(format!("node {} has invalid child index {}", i, raw))
                } else {
                    Ok(raw as usize)
                }
            };
            let left = child(left)?;
            let right = child(right)?;

            let feature = self.feature[i];
            if feature < 0 || feature >= FEATURE_COUNT as i64 {
                return Err(format!("node {} splits on invalid feature {}", i, feature));
            }

            let threshold = self.threshold[i];
            if !threshold.is_finite() {
                return Err(format!("node {} has non-finite threshold", i));
            }

            nodes.push(Node::Split {
                feature: feature as usize,
                threshold,
                left,
                right,
            });
        }

        Ok(DecisionTree { nodes })
    }
}

/// Turn a leaf's class counts into a probability distribution
fn normalize_leaf(counts: &[f64], n_classes: usize) -> Result<Vec<f64>, String> {
    if counts.len() != n_classes {
        return Err(format!(
            "value has {} entries, expected {}",
            counts.len(),
            n_classes
        ));
    }
    if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
        return Err("value contains negative or non-finite entries".to_string());
    }
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return Err("leaf has zero total mass".to_string());
    }
    Ok(counts.iter().map(|c| c / total).collect())
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Walk from the root to a leaf and return its class distribution
    fn leaf_distribution(&self, features: &[f64; FEATURE_COUNT]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }
}

/// Random-forest classifier: averages the leaf distributions of its trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    /// Number of trees in the ensemble
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl ProbabilisticModel for RandomForest {
    fn name(&self) -> &str {
        MODEL_TYPE
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        // Trees are walked in parallel, but summed in tree order so the
        // floating-point result is identical on every call.
        let leaves: Vec<&[f64]> = self
            .trees
            .par_iter()
            .map(|tree| tree.leaf_distribution(features))
            .collect();

        let mut probabilities = vec![0.0f64; self.n_classes];
        for leaf in leaves {
            for (total, p) in probabilities.iter_mut().zip(leaf) {
                *total += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        for p in probabilities.iter_mut() {
            *p /= n_trees;
        }
        probabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump_json(feature: i64, left_child: i64) -> String {
        format!(
            r#"{{
                "model_type": "random_forest",
                "feature_order_version": 1,
                "feature_names": ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"],
                "classes": ["a", "b"],
                "feature_importances": [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                "trees": [{{
                    "children_left": [{}, -1, -1],
                    "children_right": [2, -1, -1],
                    "feature": [{}, -2, -2],
                    "threshold": [50.0, -2.0, -2.0],
                    "value": [[5.0, 5.0], [4.0, 1.0], [0.0, 2.0]]
                }}]
            }}"#,
            left_child, feature
        )
    }

    #[test]
    fn test_stump_routes_on_threshold() {
        let loaded = ForestArtifact::load(&stump_json(0, 1)).unwrap();
        let forest = loaded.forest;

        let left = forest.predict_proba(&[50.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(left, vec![0.8, 0.2]);

        let right = forest.predict_proba(&[50.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(right, vec![0.0, 1.0]);
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let err = ForestArtifact::load(&stump_json(7, 1)).err().unwrap();
        assert!(err.contains("invalid feature"), "{}", err);
    }

    #[test]
    fn test_rejects_backward_child_index() {
        let err = ForestArtifact::load(&stump_json(0, 0)).err().unwrap();
        assert!(err.contains("invalid child index"), "{}", err);
    }

    #[test]
    fn test_rejects_permuted_feature_names() {
        let json = stump_json(0, 1).replace(
            r#"["N", "P", "K", "temperature", "humidity", "ph", "rainfall"]"#,
            r#"["P", "N", "K", "temperature", "humidity", "ph", "rainfall"]"#,
        );
        let err = ForestArtifact::load(&json).err().unwrap();
        assert!(err.contains("pinned order"), "{}", err);
    }

    #[test]
    fn test_rejects_unnormalized_importances() {
        let json = stump_json(0, 1).replace(
            "[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]",
            "[0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]",
        );
        let err = ForestArtifact::load(&json).err().unwrap();
        assert!(err.contains("importances"), "{}", err);
    }

    #[test]
    fn test_rejects_wrong_model_type() {
        let json = stump_json(0, 1).replace("random_forest", "gaussian_nb");
        let err = ForestArtifact::load(&json).err().unwrap();
        assert!(err.contains("model_type"), "{}", err);
    }
}
