//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON-exported scaler and SVM classifier
//! - `sanitize`: patient-data filtering for logs

pub mod artifacts;
pub mod sanitize;

pub use artifacts::ArtifactError;
