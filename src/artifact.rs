use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read '{path}'")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in '{path}'")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Rejects empty or non-finite parameter vectors.
pub(crate) fn check_params(name: &str, values: &[f64]) -> Result<(), ArtifactError> {
    if values.is_empty() {
        return Err(ArtifactError::Invalid(format!("{name} must not be empty")));
    }

    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(ArtifactError::Invalid(format!(
            "{name}[{index}] is not a finite number"
        )));
    }

    Ok(())
}
