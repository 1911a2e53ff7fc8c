//! # Cardiotriage
//!
//! Heart-attack risk triage over a pre-trained support vector classifier.
//!
//! This crate provides:
//! - The triage pipeline: feature vector, scaler, decision value, label, probability
//! - Loading of the fitted scaler and classifier from JSON artifacts
//! - Terminal UI for entering the thirteen clinical measurements
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientFeatures, RiskLabel, TriageReport)
//! - `ports`: Trait definitions for the scaler and classifier
//! - `adapters`: Concrete implementations (JSON artifacts, log sanitization)
//! - `application`: The triage service
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::TriageService;
pub use domain::{PatientFeatures, RiskLabel, TriageReport};

/// Result type for Cardiotriage operations
pub type Result<T> = std::result::Result<T, TriageError>;

/// Main error type for Cardiotriage
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Model artifacts unavailable: {0}")]
    ArtifactsUnavailable(String),

    #[error("Artifact loading failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Model operation failed: {0}")]
    Model(#[from] domain::ModelError),

    #[error("Invalid patient data: {0}")]
    Validation(String),
}
