//! Model ports: Traits for the fitted scaler and classifier.
//!
//! These traits abstract the persisted artifacts from the triage pipeline.
//! Every method works on a single feature row (one patient).

use crate::domain::{ClassProbabilities, ModelError};

/// A fitted feature-scaling transform.
pub trait FeatureScaler: Send + Sync {
    /// Number of features the transform was fitted on.
    fn n_features(&self) -> usize;

    /// Normalize one raw feature row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the row length is wrong.
    fn transform(&self, raw: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// A fitted binary classifier.
///
/// Implementations provide:
/// - A signed decision value (distance from the separating boundary)
/// - A discrete class label in {0, 1}
/// - Optionally, calibrated class probabilities
pub trait Classifier: Send + Sync {
    /// Number of features the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// Signed distance of a scaled row from the separating boundary.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the row length is wrong.
    fn decision_function(&self, x: &[f64]) -> Result<f64, ModelError>;

    /// Discrete class label for a scaled row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the row length is wrong.
    fn predict(&self, x: &[f64]) -> Result<i64, ModelError>;

    /// Whether this model variant was fitted with probability estimates.
    fn supports_probability(&self) -> bool;

    /// Class probabilities for a scaled row.
    ///
    /// Returns `Ok(None)` when [`supports_probability`] is false.
    ///
    /// [`supports_probability`]: Classifier::supports_probability
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the row length is wrong.
    fn predict_proba(&self, x: &[f64]) -> Result<Option<ClassProbabilities>, ModelError>;
}
