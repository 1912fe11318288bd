use std::env;
use std::path::PathBuf;

pub const MODEL_PATH_VAR: &str = "HEART_RISK_MODEL";
pub const SCALER_PATH_VAR: &str = "HEART_RISK_SCALER";

pub const DEFAULT_MODEL_PATH: &str = "Logistics_Model.json";
pub const DEFAULT_SCALER_PATH: &str = "normlz.json";

/// Where the model and scaler artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

impl Config {
    /// Explicit paths win, then the environment, then the defaults.
    pub fn resolve(model_path: Option<PathBuf>, scaler_path: Option<PathBuf>) -> Self {
        Self::resolve_with(model_path, scaler_path, |key| env::var(key).ok())
    }

    fn resolve_with(
        model_path: Option<PathBuf>,
        scaler_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let pick = |explicit: Option<PathBuf>, key: &str, default: &str| {
            explicit
                .or_else(|| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            model_path: pick(model_path, MODEL_PATH_VAR, DEFAULT_MODEL_PATH),
            scaler_path: pick(scaler_path, SCALER_PATH_VAR, DEFAULT_SCALER_PATH),
        }
    }
}
