//! Triage verdict types.
//!
//! Represents the output of one pass through the triage pipeline.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Binary risk label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    /// Class 0
    Low,
    /// Class 1
    High,
}

impl RiskLabel {
    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129), // Emerald (#10B981)
            Self::High => (244, 63, 94), // Rose (#F43F5E)
        }
    }
}

impl TryFrom<i64> for RiskLabel {
    type Error = ModelError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            other => Err(ModelError::UnknownLabel(other)),
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW RISK"),
            Self::High => write!(f, "HIGH RISK"),
        }
    }
}

/// Per-class probability estimate, indexed by class code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    /// Probability of class 0 (low risk)
    pub low: f64,
    /// Probability of class 1 (high risk)
    pub high: f64,
}

impl ClassProbabilities {
    /// Build from the probability of the high-risk class.
    #[must_use]
    pub fn from_high(high: f64) -> Self {
        let high = high.clamp(0.0, 1.0);
        Self {
            low: 1.0 - high,
            high,
        }
    }
}

/// Result of one triage assessment.
///
/// Built fresh per request; nothing in here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    /// Label from the classifier's discrete predict. Selects the verdict branch.
    pub label: RiskLabel,

    /// Signed distance from the separating boundary.
    pub distance: f64,

    /// Probability mass of the high-risk class, when the model supports it.
    pub probability: Option<f64>,

    /// When the assessment was produced (display only)
    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl TriageReport {
    /// Create a report stamped with the current time.
    #[must_use]
    pub fn new(label: RiskLabel, distance: f64, probability: Option<f64>) -> Self {
        Self {
            label,
            distance,
            probability,
            assessed_at: chrono::Utc::now(),
        }
    }

    /// Absolute distance from the boundary.
    #[must_use]
    pub fn margin(&self) -> f64 {
        self.distance.abs()
    }

    /// Probability of the high-risk class in percent.
    #[must_use]
    pub fn probability_percent(&self) -> Option<f64> {
        self.probability.map(|p| p * 100.0)
    }

    /// Whole percent for a progress indicator (truncated, 0..=100).
    #[must_use]
    pub fn progress_percent(&self) -> Option<u16> {
        self.probability_percent()
            .map(|pct| pct.clamp(0.0, 100.0).trunc() as u16)
    }

    #[must_use]
    pub fn headline(&self) -> String {
        format!("RESULT: {}", self.label)
    }

    /// Explanation line under the headline.
    #[must_use]
    pub fn detail(&self) -> String {
        match self.label {
            RiskLabel::High => format!(
                "The patient is deep in the high-risk zone (Distance: {:.2}). Immediate cardiovascular screening is recommended.",
                self.distance
            ),
            RiskLabel::Low => format!(
                "The patient is currently in the low-risk zone (Safety Margin: {:.2}).",
                self.margin()
            ),
        }
    }

    /// Probability line, or the caption shown when probability is unavailable.
    #[must_use]
    pub fn probability_line(&self) -> String {
        match self.probability_percent() {
            Some(pct) => format!("Calculated Probability: {pct:.1}%"),
            None => PROBABILITY_UNAVAILABLE.to_string(),
        }
    }

    /// Plain-text rendering used by the headless binary.
    #[must_use]
    pub fn render_text(&self) -> String {
        format!(
            "{}\n{}\n{}\n",
            self.headline(),
            self.detail(),
            self.probability_line()
        )
    }
}

/// Caption shown when the model has no probability support.
pub const PROBABILITY_UNAVAILABLE: &str =
    "Probability scores not enabled. Triage based on Hyperplane Distance.";
