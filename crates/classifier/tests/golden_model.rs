//! Golden tests against the bundled model artifact.
//!
//! The bundled forest is small enough to trace by hand; these tests pin the
//! feature-order contract between training and serving.

use approx::assert_relative_eq;
use classifier::CropClassifier;
use data_loader::FeatureVector;
use std::path::Path;

fn load_bundled() -> CropClassifier {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/crop_model.json");
    CropClassifier::load(path).expect("bundled model should load")
}

/// Warm, humid, nitrogen-rich paddy conditions
fn paddy_vector() -> FeatureVector {
    FeatureVector::new(90.0, 40.0, 40.0, 25.0, 80.0, 6.5, 200.0)
}

#[test]
fn test_canonical_order_reproduces_golden_prediction() {
    let classifier = load_bundled();

    let prediction = classifier.infer(&paddy_vector()).unwrap();

    assert_eq!(prediction.label, "rice");
    assert_eq!(prediction.display_name(), "Rice");
    assert_eq!(prediction.confidence, 0.8);
}

#[test]
fn test_reordered_vector_changes_prediction() {
    let classifier = load_bundled();

    let mut reversed = *paddy_vector().as_array();
    reversed.reverse();
    let probabilities = classifier.predict_proba_raw(&reversed);

    let best = probabilities
        .iter()
        .enumerate()
        .fold(0, |best, (idx, p)| if *p > probabilities[best] { idx } else { best });
    assert_eq!(classifier.class_labels()[best], "chickpea");
}

#[test]
fn test_distribution_is_normalized_and_confidence_is_its_max() {
    let classifier = load_bundled();
    let vectors = [
        paddy_vector(),
        FeatureVector::new(40.0, 67.0, 80.0, 18.0, 17.0, 7.2, 75.0),
        FeatureVector::new(78.0, 48.0, 20.0, 23.0, 62.0, 6.1, 85.0),
        FeatureVector::new(0.0, 0.0, 0.0, -5.0, 0.0, 0.0, 0.0),
    ];

    for vector in &vectors {
        let distribution = classifier.probabilities(vector);
        let total: f64 = distribution.iter().map(|c| c.probability).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);

        let max = distribution
            .iter()
            .map(|c| c.probability)
            .fold(f64::MIN, f64::max);
        let prediction = classifier.infer(vector).unwrap();
        assert!((0.0..=1.0).contains(&prediction.confidence));
        assert_eq!(prediction.confidence, classifier::round_confidence(max));
    }
}

#[test]
fn test_maize_conditions() {
    let classifier = load_bundled();

    // Moderate rainfall and humidity, nitrogen above the split, neutral pH
    let prediction = classifier
        .infer(&FeatureVector::new(78.0, 48.0, 20.0, 23.0, 62.0, 7.3, 85.0))
        .unwrap();

    assert_eq!(prediction.label, "maize");
}
