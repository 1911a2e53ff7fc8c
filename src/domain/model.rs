//! Error type shared by scaler and classifier implementations.

/// Error type for model operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Feature count mismatch: got {got}, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Invalid model parameters: {0}")]
    InvalidParameters(String),

    #[error("Classifier returned unknown class label {0}")]
    UnknownLabel(i64),

    #[error("Non-finite value produced by {0}")]
    NonFinite(&'static str),
}

/// Reject vectors that do not have the expected length.
///
/// # Errors
/// Returns `ModelError::ShapeMismatch` on a length mismatch.
pub fn check_shape(expected: usize, x: &[f64]) -> Result<(), ModelError> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(ModelError::ShapeMismatch {
            expected,
            got: x.len(),
        })
    }
}
