use std::path::Path;

use ndarray::{Array1, ArrayView1};
use serde::Deserialize;
use thiserror::Error;

use crate::artifact::{check_params, load_json, ArtifactError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerError {
    #[error("X has {actual} features, but the scaler is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("feature {index} is not a finite number")]
    NonFinite { index: usize },
}

/// A pre-fitted feature transform.
pub trait Scaler {
    /// Number of features the scaler was fitted on.
    fn n_features_in(&self) -> usize;

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScalerError>;
}

#[derive(Debug, Deserialize)]
struct StandardScalerParams {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Z-score standardisation with means and deviations fixed at fit time.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        check_params("mean", &mean)?;
        check_params("scale", &scale)?;

        if mean.len() != scale.len() {
            return Err(ArtifactError::Invalid(format!(
                "mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }

        // constant features were fitted with a zero deviation
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect::<Vec<_>>();

        Ok(Self {
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let params: StandardScalerParams = load_json(path.as_ref())?;
        Self::new(params.mean, params.scale)
    }
}

impl Scaler for StandardScaler {
    fn n_features_in(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScalerError> {
        if features.len() != self.n_features_in() {
            return Err(ScalerError::ShapeMismatch {
                expected: self.n_features_in(),
                actual: features.len(),
            });
        }

        if let Some(index) = features.iter().position(|x| !x.is_finite()) {
            return Err(ScalerError::NonFinite { index });
        }

        let features = ArrayView1::from(features);
        let scaled = (&features - &self.mean) / &self.scale;

        Ok(scaled.to_vec())
    }
}
