//! Fitted feature scalers exported as JSON.

use serde::{Deserialize, Serialize};

use crate::domain::{check_shape, ModelError};
use crate::ports::FeatureScaler;

/// Scaler artifact, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// `(x - mean) / scale`
    Standard(StandardScaler),
    /// `x * scale + min`
    MinMax(MinMaxScaler),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default = "enabled")]
    pub with_mean: bool,
    #[serde(default = "enabled")]
    pub with_std: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

fn enabled() -> bool {
    true
}

impl ScalerArtifact {
    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::Standard(s) => s.feature_names.as_deref(),
            Self::MinMax(s) => s.feature_names.as_deref(),
        }
    }

    /// Check parameter lengths and finiteness.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidParameters` describing the first problem.
    pub fn validate(&self) -> Result<(), ModelError> {
        let (a, b) = match self {
            Self::Standard(s) => (&s.mean, &s.scale),
            Self::MinMax(s) => (&s.min, &s.scale),
        };
        if a.is_empty() {
            return Err(ModelError::InvalidParameters("scaler has no features".into()));
        }
        if a.len() != b.len() {
            return Err(ModelError::InvalidParameters(format!(
                "scaler parameter lengths differ ({} vs {})",
                a.len(),
                b.len()
            )));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidParameters(
                "scaler parameters must be finite".into(),
            ));
        }
        if let Some(names) = self.feature_names() {
            if names.len() != a.len() {
                return Err(ModelError::InvalidParameters(format!(
                    "scaler declares {} feature names for {} features",
                    names.len(),
                    a.len()
                )));
            }
        }
        Ok(())
    }
}

impl FeatureScaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        match self {
            Self::Standard(s) => s.mean.len(),
            Self::MinMax(s) => s.min.len(),
        }
    }

    fn transform(&self, raw: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_shape(self.n_features(), raw)?;

        let out: Vec<f64> = match self {
            Self::Standard(s) => raw
                .iter()
                .zip(s.mean.iter().zip(s.scale.iter()))
                .map(|(&x, (&mean, &scale))| {
                    let centered = if s.with_mean { x - mean } else { x };
                    // Constant features are fitted with scale 0; leave them unscaled.
                    if s.with_std && scale != 0.0 {
                        centered / scale
                    } else {
                        centered
                    }
                })
                .collect(),
            Self::MinMax(s) => raw
                .iter()
                .zip(s.min.iter().zip(s.scale.iter()))
                .map(|(&x, (&min, &scale))| x * scale + min)
                .collect(),
        };

        if out.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("scaler transform"));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(mean: Vec<f64>, scale: Vec<f64>) -> ScalerArtifact {
        ScalerArtifact::Standard(StandardScaler {
            feature_names: None,
            mean,
            scale,
            with_mean: true,
            with_std: true,
        })
    }

    #[test]
    fn test_standard_transform() {
        let scaler = standard(vec![10.0, 0.5], vec![2.0, 0.5]);
        let out = scaler.transform(&[14.0, 0.0]).expect("transform");
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!((out[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_left_unscaled() {
        let scaler = standard(vec![1.0], vec![0.0]);
        let out = scaler.transform(&[3.0]).expect("transform");
        assert!((out[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_minmax_transform() {
        let scaler = ScalerArtifact::MinMax(MinMaxScaler {
            feature_names: None,
            min: vec![-0.5],
            scale: vec![0.01],
        });
        let out = scaler.transform(&[150.0]).expect("transform");
        assert!((out[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let scaler = standard(vec![0.0; 13], vec![1.0; 13]);
        assert_eq!(
            scaler.transform(&[1.0; 12]),
            Err(ModelError::ShapeMismatch {
                expected: 13,
                got: 12
            })
        );
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(standard(vec![0.0, 1.0], vec![1.0]).validate().is_err());
        assert!(standard(vec![f64::NAN], vec![1.0]).validate().is_err());
        assert!(standard(vec![], vec![]).validate().is_err());
        assert!(standard(vec![0.0], vec![1.0]).validate().is_ok());
    }

    #[test]
    fn test_parse_standard_json_defaults() {
        let json = r#"{"kind":"standard","mean":[1.0],"scale":[2.0]}"#;
        let scaler: ScalerArtifact = serde_json::from_str(json).expect("parse");
        match scaler {
            ScalerArtifact::Standard(s) => {
                assert!(s.with_mean && s.with_std);
                assert!(s.feature_names.is_none());
            }
            ScalerArtifact::MinMax(_) => panic!("wrong variant"),
        }
    }
}
