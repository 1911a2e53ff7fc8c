//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the triage pipeline and the persisted model artifacts.

mod classifier;

pub use classifier::{Classifier, FeatureScaler};
