//! Patient data types for heart-attack risk triage.
//!
//! Based on the UCI Heart Disease (Cleveland) features.

use serde::{Deserialize, Serialize};

/// Number of clinical features the scaler and classifier are fitted on.
pub const N_FEATURES: usize = 13;

/// Feature names in the order the artifacts were fitted on.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Clinical features entered for one triage request.
///
/// All values are held as `f64` because they are fed straight into the
/// scaler; integer and categorical constraints are enforced by [`validate`].
///
/// [`validate`]: PatientFeatures::validate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatures {
    /// Age in years (1-120)
    pub age: f64,

    /// Sex: 0 = female, 1 = male
    pub sex: f64,

    /// Chest pain type: 0 typical angina, 1 atypical, 2 non-anginal, 3 asymptomatic
    pub cp: f64,

    /// Resting blood pressure in mmHg (80-200)
    pub trestbps: f64,

    /// Serum cholesterol in mg/dl (100-600)
    pub chol: f64,

    /// Fasting blood sugar > 120 mg/dl: 0 = false, 1 = true
    pub fbs: f64,

    /// Resting ECG result (0-2)
    pub restecg: f64,

    /// Maximum heart rate achieved (60-220)
    pub thalach: f64,

    /// Exercise induced angina: 0 = no, 1 = yes
    pub exang: f64,

    /// ST depression induced by exercise relative to rest (0.0-6.0)
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment (0-2)
    pub slope: f64,

    /// Number of major vessels colored by fluoroscopy (0-4)
    pub ca: f64,

    /// Thalassemia: 1 normal, 2 fixed defect, 3 reversible defect
    pub thal: f64,
}

impl Default for PatientFeatures {
    /// The values the entry form starts with.
    fn default() -> Self {
        Self {
            age: 50.0,
            sex: 0.0,
            cp: 0.0,
            trestbps: 120.0,
            chol: 200.0,
            fbs: 0.0,
            restecg: 0.0,
            thalach: 150.0,
            exang: 0.0,
            oldpeak: 1.0,
            slope: 0.0,
            ca: 0.0,
            thal: 1.0,
        }
    }
}

impl PatientFeatures {
    /// Convert features to a vector for inference.
    /// Order matches [`FEATURE_NAMES`].
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Create features from a vector in [`FEATURE_NAMES`] order.
    ///
    /// # Errors
    /// Returns error if vector length is not 13.
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        if v.len() != N_FEATURES {
            return Err(format!("Expected {N_FEATURES} features, got {}", v.len()));
        }

        Ok(Self {
            age: v[0],
            sex: v[1],
            cp: v[2],
            trestbps: v[3],
            chol: v[4],
            fbs: v[5],
            restecg: v[6],
            thalach: v[7],
            exang: v[8],
            oldpeak: v[9],
            slope: v[10],
            ca: v[11],
            thal: v[12],
        })
    }

    /// Validate that all features are within the ranges the form allows.
    ///
    /// # Errors
    /// Returns every violation found as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_whole(&mut errors, "Age", self.age, 1.0, 120.0);
        check_code(&mut errors, "Sex", self.sex, &[0.0, 1.0]);
        check_code(&mut errors, "Chest pain type", self.cp, &[0.0, 1.0, 2.0, 3.0]);
        check_whole(&mut errors, "Resting BP", self.trestbps, 80.0, 200.0);
        check_whole(&mut errors, "Cholesterol", self.chol, 100.0, 600.0);
        check_code(&mut errors, "Fasting blood sugar", self.fbs, &[0.0, 1.0]);
        check_code(&mut errors, "Resting ECG", self.restecg, &[0.0, 1.0, 2.0]);
        check_whole(&mut errors, "Max heart rate", self.thalach, 60.0, 220.0);
        check_code(&mut errors, "Exercise angina", self.exang, &[0.0, 1.0]);
        if !self.oldpeak.is_finite() || !(0.0..=6.0).contains(&self.oldpeak) {
            errors.push(format!("ST depression {} out of range [0.0, 6.0]", self.oldpeak));
        }
        check_code(&mut errors, "ST slope", self.slope, &[0.0, 1.0, 2.0]);
        check_code(&mut errors, "Major vessels", self.ca, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        check_code(&mut errors, "Thalassemia", self.thal, &[1.0, 2.0, 3.0]);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_whole(errors: &mut Vec<String>, label: &str, value: f64, min: f64, max: f64) {
    if !value.is_finite() || !(min..=max).contains(&value) {
        errors.push(format!("{label} {value} out of range [{min}, {max}]"));
    } else if value.fract() != 0.0 {
        errors.push(format!("{label} {value} must be a whole number"));
    }
}

fn check_code(errors: &mut Vec<String>, label: &str, value: f64, codes: &[f64]) {
    if !codes.contains(&value) {
        let allowed: Vec<String> = codes.iter().map(|c| format!("{c}")).collect();
        errors.push(format!("{label} {value} must be one of {}", allowed.join(", ")));
    }
}
