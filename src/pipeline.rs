//! The assessment pipeline: encode, scale with a single fallback, then predict on demand.

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::Config;
use crate::features::{FeatureVector, PatientInput, FEATURE_COUNT};
use crate::model::{Classifier, LogisticRegression, ModelError};
use crate::parse::Record;
use crate::report::{Assessment, UnexpectedLabel};
use crate::scaler::{Scaler, ScalerError, StandardScaler};

pub const TRANSFORM_FAILED: &str =
    "Could not transform features. Please check your model and scaler.";

pub const PREDICTION_HINT: &str = "This might be due to a mismatch between the model's \
expected features and the provided features.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Info(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Label(#[from] UnexpectedLabel),
}

/// What the user asked for in this interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Inputs changed; encode and scale only.
    Preview,
    /// The predict button was pressed.
    Predict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Scaling failed for good; nothing else is rendered.
    Halted,
    /// Features are ready but no prediction was requested.
    Pending,
    Assessed(Assessment),
    PredictionFailed,
}

/// Everything produced by one pass over the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub features: FeatureVector,
    pub scaled: Option<Vec<f64>>,
    pub notices: Vec<Notice>,
    pub outcome: Outcome,
}

/// Features handed to the first scale attempt.
pub fn primary_features(features: &FeatureVector) -> Vec<f64> {
    features.to_vec()
}

/// Features handed to the one retry after a shape mismatch.
///
/// This is still the full, unmodified vector, so a scaler that rejected the first attempt
/// on shape rejects this one as well.
pub fn fallback_features(features: &FeatureVector) -> Vec<f64> {
    features.to_vec()
}

/// Read-only holder of the loaded model and scaler, built once at startup.
pub struct RiskService {
    model: Box<dyn Classifier + Send + Sync>,
    scaler: Box<dyn Scaler + Send + Sync>,
}

impl RiskService {
    pub fn new(
        model: impl Classifier + Send + Sync + 'static,
        scaler: impl Scaler + Send + Sync + 'static,
    ) -> Self {
        Self {
            model: Box::new(model),
            scaler: Box::new(scaler),
        }
    }

    pub fn load(config: &Config) -> Result<Self, ArtifactError> {
        let model = LogisticRegression::load(&config.model_path)?;
        info!(
            "loaded model from {} ({} features)",
            config.model_path.display(),
            model.n_features_in()
        );

        let scaler = StandardScaler::load(&config.scaler_path)?;
        info!(
            "loaded scaler from {} ({} features)",
            config.scaler_path.display(),
            scaler.n_features_in()
        );

        if model.n_features_in() != scaler.n_features_in() {
            warn!(
                "model expects {} features but scaler was fitted on {}",
                model.n_features_in(),
                scaler.n_features_in()
            );
        }

        Ok(Self::new(model, scaler))
    }

    /// Scales `features`, retrying once through [`fallback_features`] when the scaler
    /// rejects the shape. Notices for the user are appended to `notices`.
    pub fn scale(
        &self,
        features: &FeatureVector,
        notices: &mut Vec<Notice>,
    ) -> Result<Vec<f64>, ScalerError> {
        let err = match self.scaler.transform(&primary_features(features)) {
            Ok(scaled) => return Ok(scaled),
            Err(err @ ScalerError::ShapeMismatch { .. }) => err,
            Err(err) => {
                error!("scaler failed: {err}");
                notices.push(Notice::Error(TRANSFORM_FAILED.to_string()));
                return Err(err);
            }
        };

        warn!("scaler rejected the feature vector: {err}");
        notices.push(Notice::Error(format!("Feature mismatch error: {err}")));
        notices.push(Notice::Info(format!(
            "Trying with all {FEATURE_COUNT} features..."
        )));

        info!("retrying transform with the fallback feature vector");
        self.scaler
            .transform(&fallback_features(features))
            .map_err(|err| {
                error!("fallback transform failed: {err}");
                notices.push(Notice::Error(TRANSFORM_FAILED.to_string()));
                err
            })
    }

    pub fn predict(&self, scaled: &[f64]) -> Result<Assessment, PredictionError> {
        let label = self.model.predict(scaled)?;
        let proba = self.model.predict_proba(scaled)?;
        debug!("prediction: label={label} proba={proba:?}");

        Ok(Assessment::from_prediction(label, proba)?)
    }

    /// Runs one interaction over the form.
    pub fn assess(&self, input: &PatientInput, action: Action) -> Interaction {
        let features = input.encode();
        let mut notices = Vec::new();

        let Ok(scaled) = self.scale(&features, &mut notices) else {
            return Interaction {
                features,
                scaled: None,
                notices,
                outcome: Outcome::Halted,
            };
        };

        let outcome = match action {
            Action::Preview => Outcome::Pending,
            Action::Predict => match self.predict(&scaled) {
                Ok(assessment) => Outcome::Assessed(assessment),
                Err(err) => {
                    error!("prediction failed: {err}");
                    notices.push(Notice::Error(format!("Prediction error: {err}")));
                    notices.push(Notice::Info(PREDICTION_HINT.to_string()));
                    Outcome::PredictionFailed
                }
            },
        };

        Interaction {
            features,
            scaled: Some(scaled),
            notices,
            outcome,
        }
    }

    /// Scores already-encoded records, one result per record.
    pub fn score_records(&self, records: &[Record]) -> Vec<Result<Assessment, BatchError>> {
        records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let mut notices = Vec::new();
                let scaled = self.scale(&record.features, &mut notices);
                for notice in &notices {
                    debug!("row {}: {notice:?}", row + 1);
                }
                Ok(self.predict(&scaled?)?)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("could not transform features: {0}")]
    Scale(#[from] ScalerError),
    #[error("prediction error: {0}")]
    Predict(#[from] PredictionError),
}

/// Share of labelled records whose predicted class matches the target, in percent.
///
/// `None` when no record carries a target.
pub fn accuracy(records: &[Record], results: &[Result<Assessment, BatchError>]) -> Option<f64> {
    let mut labelled = 0;
    let mut correct_predictions = 0;

    for (record, result) in records.iter().zip(results) {
        let Some(target) = record.target else {
            continue;
        };
        labelled += 1;

        if let Ok(assessment) = result {
            if assessment.class() == target {
                correct_predictions += 1;
            }
        }
    }

    if labelled == 0 {
        None
    } else {
        Some(correct_predictions as f64 / labelled as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::report::RiskLevel;

    struct Identity;

    impl Scaler for Identity {
        fn n_features_in(&self) -> usize {
            FEATURE_COUNT
        }

        fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScalerError> {
            Ok(features.to_vec())
        }
    }

    /// Fails on shape for the first `failures` calls, then passes features through.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl Flaky {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Scaler for Flaky {
        fn n_features_in(&self) -> usize {
            FEATURE_COUNT - 1
        }

        fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScalerError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ScalerError::ShapeMismatch {
                    expected: FEATURE_COUNT - 1,
                    actual: features.len(),
                })
            } else {
                Ok(features.to_vec())
            }
        }
    }

    struct Broken;

    impl Scaler for Broken {
        fn n_features_in(&self) -> usize {
            FEATURE_COUNT
        }

        fn transform(&self, _features: &[f64]) -> Result<Vec<f64>, ScalerError> {
            Err(ScalerError::NonFinite { index: 0 })
        }
    }

    struct Fixed {
        label: u8,
        proba: [f64; 2],
    }

    impl Classifier for Fixed {
        fn n_features_in(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ModelError> {
            Ok(self.proba)
        }

        fn predict(&self, _features: &[f64]) -> Result<u8, ModelError> {
            Ok(self.label)
        }
    }

    struct Failing;

    impl Classifier for Failing {
        fn n_features_in(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ModelError> {
            Err(ModelError::ShapeMismatch {
                expected: 12,
                actual: features.len(),
            })
        }
    }

    fn high_risk() -> Fixed {
        Fixed {
            label: 1,
            proba: [0.2, 0.8],
        }
    }

    #[test]
    fn preview_does_not_predict() {
        thread_local!(static CALLED: Cell<bool> = const { Cell::new(false) });

        struct Watched;

        impl Classifier for Watched {
            fn n_features_in(&self) -> usize {
                FEATURE_COUNT
            }

            fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ModelError> {
                CALLED.with(|called| called.set(true));
                Ok([0.5, 0.5])
            }
        }

        let service = RiskService::new(Watched, Identity);
        let interaction = service.assess(&PatientInput::default(), Action::Preview);

        assert_eq!(interaction.outcome, Outcome::Pending);
        assert!(interaction.notices.is_empty());
        assert!(!CALLED.with(Cell::get));
    }

    #[test]
    fn predict_renders_an_assessment() {
        let service = RiskService::new(high_risk(), Identity);

        let interaction = service.assess(&PatientInput::default(), Action::Predict);

        let Outcome::Assessed(assessment) = interaction.outcome else {
            panic!("expected an assessment, got {:?}", interaction.outcome);
        };
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(
            interaction.scaled.as_deref(),
            Some(&interaction.features[..])
        );
    }

    #[test]
    fn shape_mismatch_on_both_attempts_halts() {
        let scaler = Flaky::new(usize::MAX);
        let service = RiskService::new(high_risk(), scaler);

        let interaction = service.assess(&PatientInput::default(), Action::Predict);

        assert_eq!(interaction.outcome, Outcome::Halted);
        assert_eq!(interaction.scaled, None);
        assert_eq!(
            interaction.notices,
            vec![
                Notice::Error(
                    "Feature mismatch error: X has 13 features, but the scaler is expecting \
12 features as input"
                        .to_string()
                ),
                Notice::Info("Trying with all 13 features...".to_string()),
                Notice::Error(TRANSFORM_FAILED.to_string()),
            ]
        );
    }

    #[test]
    fn recovered_retry_still_reports_the_first_failure() {
        let service = RiskService::new(high_risk(), Flaky::new(1));

        let interaction = service.assess(&PatientInput::default(), Action::Predict);

        assert!(matches!(interaction.outcome, Outcome::Assessed(_)));
        assert_eq!(interaction.notices.len(), 2);
        assert!(matches!(
            &interaction.notices[0],
            Notice::Error(msg) if msg.starts_with("Feature mismatch error")
        ));
    }

    #[test]
    fn retry_uses_the_same_vector() {
        let features = PatientInput::default().encode();

        assert_eq!(primary_features(&features), fallback_features(&features));
        assert_eq!(fallback_features(&features).len(), FEATURE_COUNT);
    }

    #[test]
    fn other_scaler_errors_skip_the_retry() {
        let service = RiskService::new(high_risk(), Broken);

        let interaction = service.assess(&PatientInput::default(), Action::Predict);

        assert_eq!(interaction.outcome, Outcome::Halted);
        assert_eq!(
            interaction.notices,
            vec![Notice::Error(TRANSFORM_FAILED.to_string())]
        );
    }

    #[test]
    fn model_errors_are_reported_without_a_result() {
        let service = RiskService::new(Failing, Identity);

        let interaction = service.assess(&PatientInput::default(), Action::Predict);

        assert_eq!(interaction.outcome, Outcome::PredictionFailed);
        assert_eq!(
            interaction.notices,
            vec![
                Notice::Error(
                    "Prediction error: X has 13 features, but the model is expecting 12 \
features as input"
                        .to_string()
                ),
                Notice::Info(PREDICTION_HINT.to_string()),
            ]
        );
    }

    #[test]
    fn unexpected_labels_are_prediction_errors() {
        let model = Fixed {
            label: 7,
            proba: [0.5, 0.5],
        };
        let service = RiskService::new(model, Identity);

        let interaction = service.assess(&PatientInput::default(), Action::Predict);

        assert_eq!(interaction.outcome, Outcome::PredictionFailed);
    }

    #[test]
    fn accuracy_counts_only_labelled_records() {
        let service = RiskService::new(high_risk(), Identity);
        let features = PatientInput::default().encode();
        let records = vec![
            Record {
                features,
                target: Some(1),
            },
            Record {
                features,
                target: Some(0),
            },
            Record {
                features,
                target: None,
            },
        ];

        let results = service.score_records(&records);

        assert_eq!(results.len(), 3);
        assert_eq!(accuracy(&records, &results), Some(50.0));
        assert_eq!(accuracy(&records[2..], &results[2..]), None);
    }

    #[test]
    fn batch_rows_fail_independently() {
        let service = RiskService::new(high_risk(), Flaky::new(2));
        let features = PatientInput::default().encode();
        let records = vec![
            Record {
                features,
                target: None,
            },
            Record {
                features,
                target: None,
            },
        ];

        let results = service.score_records(&records);

        assert!(matches!(results[0], Err(BatchError::Scale(_))));
        assert!(results[1].is_ok());
    }
}
