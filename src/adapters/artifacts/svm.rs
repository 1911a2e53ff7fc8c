//! Support vector classifiers exported as JSON.
//!
//! Two layouts are accepted:
//! - `linear_svc`: primal weights, `d(x) = coef · x + intercept`
//! - `svc`: support vectors with a kernel, `d(x) = Σ dual_coef_i K(sv_i, x) + intercept`
//!
//! In both, a positive decision value selects `classes[1]`. Platt parameters,
//! when exported, map the decision value to `P(classes[1]) = 1 / (1 + exp(A d + B))`.
//!
//! `A` and `B` are defined on `d` as computed here. libsvm-based trainers
//! (scikit-learn's `probA_`/`probB_`) fit them on libsvm's own decision value,
//! which for a binary problem is `-d`; such values must be converted to this
//! convention when exported, not copied verbatim.

use serde::{Deserialize, Serialize};

use crate::domain::{check_shape, ClassProbabilities, ModelError};
use crate::ports::Classifier;

/// Classifier artifact, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SvmClassifier {
    LinearSvc(LinearSvc),
    Svc(KernelSvc),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvc {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub coef: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
    #[serde(default)]
    pub probability: Option<PlattParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSvc {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub kernel: Kernel,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
    #[serde(default)]
    pub probability: Option<PlattParams>,
}

/// Kernel function of a [`KernelSvc`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: u32 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Kernel {
    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Self::Linear => dot(a, b),
            Self::Rbf { gamma } => {
                let sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * sq).exp()
            }
            Self::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * dot(a, b) + coef0).powi(degree as i32),
            Self::Sigmoid { gamma, coef0 } => (gamma * dot(a, b) + coef0).tanh(),
        }
    }

    fn params_finite(&self) -> bool {
        match *self {
            Self::Linear => true,
            Self::Rbf { gamma } => gamma.is_finite(),
            Self::Poly { gamma, coef0, .. } | Self::Sigmoid { gamma, coef0 } => {
                gamma.is_finite() && coef0.is_finite()
            }
        }
    }
}

/// Platt scaling parameters fitted at training time.
///
/// Applied to this module's decision value: a calibrated model has
/// `prob_a < 0`, and `P(classes[1]) = 0.5` at `d = -prob_b / prob_a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattParams {
    pub prob_a: f64,
    pub prob_b: f64,
}

impl PlattParams {
    /// Probability of `classes[1]` for a decision value.
    #[must_use]
    pub fn positive_probability(&self, decision: f64) -> f64 {
        1.0 / (1.0 + (self.prob_a * decision + self.prob_b).exp())
    }
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl SvmClassifier {
    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::LinearSvc(m) => m.feature_names.as_deref(),
            Self::Svc(m) => m.feature_names.as_deref(),
        }
    }

    fn classes(&self) -> [i64; 2] {
        match self {
            Self::LinearSvc(m) => m.classes,
            Self::Svc(m) => m.classes,
        }
    }

    fn platt(&self) -> Option<PlattParams> {
        match self {
            Self::LinearSvc(m) => m.probability,
            Self::Svc(m) => m.probability,
        }
    }

    /// Check parameter shapes, finiteness and class labels.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidParameters` describing the first problem.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidParameters(msg));

        let n = self.n_features();
        if n == 0 {
            return invalid("classifier has no features".into());
        }

        match self {
            Self::LinearSvc(m) => {
                if !m.intercept.is_finite() || m.coef.iter().any(|v| !v.is_finite()) {
                    return invalid("coefficients must be finite".into());
                }
            }
            Self::Svc(m) => {
                if m.support_vectors.len() != m.dual_coef.len() {
                    return invalid(format!(
                        "{} support vectors but {} dual coefficients",
                        m.support_vectors.len(),
                        m.dual_coef.len()
                    ));
                }
                if m.support_vectors.iter().any(|sv| sv.len() != n) {
                    return invalid("support vectors have inconsistent lengths".into());
                }
                let finite = m.intercept.is_finite()
                    && m.kernel.params_finite()
                    && m.dual_coef.iter().all(|v| v.is_finite())
                    && m.support_vectors.iter().flatten().all(|v| v.is_finite());
                if !finite {
                    return invalid("SVC parameters must be finite".into());
                }
            }
        }

        let mut classes = self.classes();
        classes.sort_unstable();
        if classes != [0, 1] {
            return invalid(format!("classes must be 0 and 1, got {:?}", self.classes()));
        }

        if let Some(p) = self.platt() {
            if !p.prob_a.is_finite() || !p.prob_b.is_finite() {
                return invalid("Platt parameters must be finite".into());
            }
        }

        if let Some(names) = self.feature_names() {
            if names.len() != n {
                return invalid(format!(
                    "classifier declares {} feature names for {n} features",
                    names.len()
                ));
            }
        }

        Ok(())
    }
}

impl Classifier for SvmClassifier {
    fn n_features(&self) -> usize {
        match self {
            Self::LinearSvc(m) => m.coef.len(),
            Self::Svc(m) => m.support_vectors.first().map_or(0, Vec::len),
        }
    }

    fn decision_function(&self, x: &[f64]) -> Result<f64, ModelError> {
        check_shape(self.n_features(), x)?;

        let d = match self {
            Self::LinearSvc(m) => dot(&m.coef, x) + m.intercept,
            Self::Svc(m) => {
                m.support_vectors
                    .iter()
                    .zip(&m.dual_coef)
                    .map(|(sv, alpha)| alpha * m.kernel.eval(sv, x))
                    .sum::<f64>()
                    + m.intercept
            }
        };

        if d.is_finite() {
            Ok(d)
        } else {
            Err(ModelError::NonFinite("decision function"))
        }
    }

    fn predict(&self, x: &[f64]) -> Result<i64, ModelError> {
        let d = self.decision_function(x)?;
        let [negative, positive] = self.classes();
        Ok(if d > 0.0 { positive } else { negative })
    }

    fn supports_probability(&self) -> bool {
        self.platt().is_some()
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Option<ClassProbabilities>, ModelError> {
        let Some(platt) = self.platt() else {
            return Ok(None);
        };

        let d = self.decision_function(x)?;
        let positive = platt.positive_probability(d);
        if !positive.is_finite() {
            return Err(ModelError::NonFinite("probability estimate"));
        }

        // Report by class code, whichever column the model stores first.
        let high = if self.classes()[1] == 1 {
            positive
        } else {
            1.0 - positive
        };
        Ok(Some(ClassProbabilities::from_high(high)))
    }
}
