//! Triage service: runs one patient record through scaler and classifier.
//!
//! The pipeline is stateless. Each call:
//! 1. Assembles the ordered feature vector
//! 2. Applies the fitted scaler
//! 3. Computes the signed decision value
//! 4. Computes the discrete label (this selects the verdict)
//! 5. Builds the report
//! 6. Adds a probability estimate when the model supports one

use std::sync::Arc;

use crate::adapters::artifacts::{ScalerArtifact, SvmClassifier, TriageArtifacts};
use crate::domain::{PatientFeatures, RiskLabel, TriageReport, N_FEATURES};
use crate::ports::{Classifier, FeatureScaler};
use crate::TriageError;

/// Service running the triage pipeline over loaded artifacts.
///
/// Holds shared, read-only handles; constructing the service is the only way
/// to run a prediction, so no prediction can execute without both artifacts.
pub struct TriageService<C, S>
where
    C: Classifier,
    S: FeatureScaler,
{
    classifier: Arc<C>,
    scaler: Arc<S>,
}

impl<C, S> Clone for TriageService<C, S>
where
    C: Classifier,
    S: FeatureScaler,
{
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            scaler: Arc::clone(&self.scaler),
        }
    }
}

impl TriageService<SvmClassifier, ScalerArtifact> {
    /// Build a service over artifacts loaded from disk.
    ///
    /// # Errors
    /// Returns error if the artifacts do not describe the expected features.
    pub fn from_artifacts(artifacts: &TriageArtifacts) -> Result<Self, TriageError> {
        Self::new(
            Arc::clone(&artifacts.classifier),
            Arc::clone(&artifacts.scaler),
        )
    }
}

impl<C, S> TriageService<C, S>
where
    C: Classifier,
    S: FeatureScaler,
{
    /// Create a new triage service.
    ///
    /// # Errors
    /// Returns `TriageError::ArtifactsUnavailable` if either artifact is not
    /// fitted on the 13 clinical features.
    pub fn new(classifier: Arc<C>, scaler: Arc<S>) -> Result<Self, TriageError> {
        if scaler.n_features() != N_FEATURES || classifier.n_features() != N_FEATURES {
            return Err(TriageError::ArtifactsUnavailable(format!(
                "expected {N_FEATURES} features, scaler has {}, classifier has {}",
                scaler.n_features(),
                classifier.n_features()
            )));
        }
        Ok(Self { classifier, scaler })
    }

    /// Whether reports from this service carry a probability.
    #[must_use]
    pub fn supports_probability(&self) -> bool {
        self.classifier.supports_probability()
    }

    /// Assess one patient record.
    ///
    /// # Errors
    /// Returns `TriageError::Validation` for out-of-range input and
    /// `TriageError::Model` if the scaler or classifier fails.
    pub fn assess(&self, features: &PatientFeatures) -> Result<TriageReport, TriageError> {
        features
            .validate()
            .map_err(|errors| TriageError::Validation(errors.join(", ")))?;

        tracing::debug!("Step 1: Assembling feature vector");
        let raw = features.to_vec();

        tracing::debug!("Step 2: Scaling features");
        let scaled = self.scaler.transform(&raw)?;

        tracing::debug!("Step 3: Computing decision value");
        let distance = self.classifier.decision_function(&scaled)?;

        tracing::debug!("Step 4: Predicting class label");
        let label = RiskLabel::try_from(self.classifier.predict(&scaled)?)?;

        if (distance > 0.0) != (label == RiskLabel::High) {
            tracing::warn!(
                %label,
                distance,
                "Predicted label disagrees with decision sign; using label"
            );
        }

        tracing::debug!("Step 5: Estimating probability");
        let probability = self
            .classifier
            .predict_proba(&scaled)?
            .map(|p| p.high);
        if probability.is_none() {
            tracing::debug!("Model has no probability support; reporting distance only");
        }

        let report = TriageReport::new(label, distance, probability);

        tracing::info!(
            label = %report.label,
            margin = format_args!("{:.2}", report.margin()),
            probability = report.probability.is_some(),
            "Triage complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifacts::{LinearSvc, PlattParams, StandardScaler};
    use crate::config::ArtifactSettings;
    use crate::domain::{ClassProbabilities, ModelError};

    fn example() -> PatientFeatures {
        PatientFeatures {
            age: 50.0,
            sex: 1.0,
            cp: 0.0,
            trestbps: 120.0,
            chol: 200.0,
            fbs: 0.0,
            restecg: 0.0,
            thalach: 150.0,
            exang: 0.0,
            oldpeak: 1.0,
            slope: 1.0,
            ca: 0.0,
            thal: 2.0,
        }
    }

    fn shipped_service() -> TriageService<SvmClassifier, ScalerArtifact> {
        let artifacts =
            TriageArtifacts::load(&ArtifactSettings::in_dir("models")).expect("load shipped");
        TriageService::from_artifacts(&artifacts).expect("service")
    }

    fn identity_scaler() -> Arc<ScalerArtifact> {
        Arc::new(ScalerArtifact::Standard(StandardScaler {
            feature_names: None,
            mean: vec![0.0; N_FEATURES],
            scale: vec![1.0; N_FEATURES],
            with_mean: true,
            with_std: true,
        }))
    }

    /// Linear model driven by the age feature only.
    fn age_model(
        threshold: f64,
        classes: [i64; 2],
        probability: Option<PlattParams>,
    ) -> Arc<SvmClassifier> {
        let mut coef = vec![0.0; N_FEATURES];
        coef[0] = 1.0;
        Arc::new(SvmClassifier::LinearSvc(LinearSvc {
            feature_names: None,
            coef,
            intercept: -threshold,
            classes,
            probability,
        }))
    }

    #[test]
    fn test_example_record_is_deterministic() {
        let service = shipped_service();
        let first = service.assess(&example()).expect("assess");
        for _ in 0..10 {
            let again = service.assess(&example()).expect("assess");
            assert_eq!(again.label, first.label);
            assert_eq!(again.distance.to_bits(), first.distance.to_bits());
            assert_eq!(again.probability, first.probability);
        }
        assert!(first.distance.is_finite());
        assert!(matches!(
            first.headline().as_str(),
            "RESULT: HIGH RISK" | "RESULT: LOW RISK"
        ));
    }

    #[test]
    fn test_boundary_records_accepted() {
        let service = shipped_service();
        for (age, oldpeak) in [(1.0, 0.0), (120.0, 6.0), (1.0, 6.0), (120.0, 0.0)] {
            for thal in [1.0, 2.0, 3.0] {
                let record = PatientFeatures {
                    age,
                    oldpeak,
                    ca: 4.0,
                    thal,
                    ..example()
                };
                let report = service.assess(&record).expect("boundary accepted");
                assert!(report.margin().is_finite());
            }
        }
    }

    #[test]
    fn test_probability_in_range_and_tracks_high_class() {
        let service = shipped_service();
        let report = service.assess(&example()).expect("assess");
        let pct = report.probability_percent().expect("shipped model is calibrated");
        assert!((0.0..=100.0).contains(&pct));

        // Platt slope is negative, so high-risk mass grows with distance.
        if report.label == RiskLabel::High && report.distance > 0.0 {
            assert!(pct > 50.0);
        }
    }

    #[test]
    fn test_label_selects_branch() {
        let service =
            TriageService::new(age_model(60.0, [0, 1], None), identity_scaler()).expect("service");

        let high = service
            .assess(&PatientFeatures {
                age: 70.0,
                ..example()
            })
            .expect("assess");
        assert_eq!(high.label, RiskLabel::High);
        assert!((high.distance - 10.0).abs() < 1e-9);
        assert!(high.detail().contains("Distance: 10.00"));

        let low = service
            .assess(&PatientFeatures {
                age: 45.0,
                ..example()
            })
            .expect("assess");
        assert_eq!(low.label, RiskLabel::Low);
        assert!(low.detail().contains("Safety Margin: 15.00"));
    }

    #[test]
    fn test_label_wins_over_distance_sign() {
        // Classes stored in reverse: positive distance predicts class 0.
        let service =
            TriageService::new(age_model(60.0, [1, 0], None), identity_scaler()).expect("service");
        let report = service
            .assess(&PatientFeatures {
                age: 70.0,
                ..example()
            })
            .expect("assess");
        assert_eq!(report.label, RiskLabel::Low);
        assert!(report.distance > 0.0);
        assert!(report.detail().contains("Safety Margin: 10.00"));
    }

    #[test]
    fn test_missing_probability_is_not_an_error() {
        let service =
            TriageService::new(age_model(60.0, [0, 1], None), identity_scaler()).expect("service");
        assert!(!service.supports_probability());
        let report = service.assess(&example()).expect("assess");
        assert!(report.probability.is_none());
        assert!(report.probability_line().contains("not enabled"));
    }

    #[test]
    fn test_probability_reported_for_high_class_with_reversed_columns() {
        let platt = Some(PlattParams {
            prob_a: -0.5,
            prob_b: 0.0,
        });
        let service =
            TriageService::new(age_model(60.0, [1, 0], platt), identity_scaler()).expect("service");
        let report = service
            .assess(&PatientFeatures {
                age: 80.0,
                ..example()
            })
            .expect("assess");
        // Positive side is class 0, so the high-risk mass is small.
        assert_eq!(report.label, RiskLabel::Low);
        assert!(report.probability.expect("supported") < 0.5);
    }

    #[test]
    fn test_invalid_record_rejected_before_inference() {
        let service = shipped_service();
        let err = service
            .assess(&PatientFeatures {
                age: 0.0,
                ..example()
            })
            .expect_err("must fail");
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn test_mismatched_artifacts_rejected() {
        let small = Arc::new(SvmClassifier::LinearSvc(LinearSvc {
            feature_names: None,
            coef: vec![1.0; 9],
            intercept: 0.0,
            classes: [0, 1],
            probability: None,
        }));
        let result = TriageService::new(small, identity_scaler());
        assert!(matches!(result, Err(TriageError::ArtifactsUnavailable(_))));
    }

    struct ShortScaler;

    impl FeatureScaler for ShortScaler {
        fn n_features(&self) -> usize {
            N_FEATURES
        }

        fn transform(&self, raw: &[f64]) -> Result<Vec<f64>, ModelError> {
            Ok(raw[..4].to_vec())
        }
    }

    struct Unlabelled;

    impl Classifier for Unlabelled {
        fn n_features(&self) -> usize {
            N_FEATURES
        }
        fn decision_function(&self, _x: &[f64]) -> Result<f64, ModelError> {
            Ok(1.0)
        }
        fn predict(&self, _x: &[f64]) -> Result<i64, ModelError> {
            Ok(7)
        }
        fn supports_probability(&self) -> bool {
            false
        }
        fn predict_proba(&self, _x: &[f64]) -> Result<Option<ClassProbabilities>, ModelError> {
            Ok(None)
        }
    }

    #[test]
    fn test_scaler_model_mismatch_propagates() {
        let service = TriageService::new(age_model(60.0, [0, 1], None), Arc::new(ShortScaler))
            .expect("service");
        let err = service.assess(&example()).expect_err("must fail");
        assert!(matches!(
            err,
            TriageError::Model(ModelError::ShapeMismatch { expected: 13, got: 4 })
        ));
    }

    #[test]
    fn test_unknown_label_propagates() {
        let service =
            TriageService::new(Arc::new(Unlabelled), identity_scaler()).expect("service");
        let err = service.assess(&example()).expect_err("must fail");
        assert!(matches!(err, TriageError::Model(ModelError::UnknownLabel(7))));
    }
}
