use std::path::Path;

use ndarray::{Array1, ArrayView1};
use serde::Deserialize;
use thiserror::Error;

use crate::artifact::{check_params, load_json, ArtifactError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("X has {actual} features, but the model is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("input contains a non-finite value at index {index}")]
    NonFinite { index: usize },
}

/// A pre-trained binary classifier with classes `0` and `1`.
pub trait Classifier {
    fn n_features_in(&self) -> usize;

    /// Returns `[P(class 0), P(class 1)]`.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ModelError>;

    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        let [_, positive] = self.predict_proba(features)?;
        Ok(u8::from(positive > 0.5))
    }
}

#[derive(Debug, Deserialize)]
struct LogisticRegressionParams {
    coefficients: Vec<f64>,
    intercept: f64,
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    weights: Array1<f64>,
    intercept: f64,
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ArtifactError> {
        check_params("coefficients", &coefficients)?;
        if !intercept.is_finite() {
            return Err(ArtifactError::Invalid(
                "intercept is not a finite number".to_string(),
            ));
        }

        Ok(Self {
            weights: Array1::from(coefficients),
            intercept,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let params: LogisticRegressionParams = load_json(path.as_ref())?;
        Self::new(params.coefficients, params.intercept)
    }

    /// Signed distance to the separating hyperplane.
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.weights.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }

        if let Some(index) = features.iter().position(|x| !x.is_finite()) {
            return Err(ModelError::NonFinite { index });
        }

        Ok(ArrayView1::from(features).dot(&self.weights) + self.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn n_features_in(&self) -> usize {
        self.weights.len()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ModelError> {
        let positive = sigmoid(self.decision_function(features)?);
        Ok([1.0 - positive, positive])
    }

    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        Ok(u8::from(self.decision_function(features)? > 0.0))
    }
}
