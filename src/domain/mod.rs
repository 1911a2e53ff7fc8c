//! Domain layer: Core triage types.
//!
//! Pure Rust types with no I/O. All types are serializable and implement
//! strict validation.

mod model;
mod patient;
mod verdict;

pub use model::{check_shape, ModelError};
pub use patient::{PatientFeatures, FEATURE_NAMES, N_FEATURES};
pub use verdict::{ClassProbabilities, RiskLabel, TriageReport, PROBABILITY_UNAVAILABLE};
