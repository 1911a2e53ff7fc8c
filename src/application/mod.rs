//! Application layer: Use cases and services.
//!
//! Orchestrates domain types with the model ports to implement triage.

mod triage;

pub use triage::TriageService;
