//! Serializable forecast configuration.

use std::path::Path;

use bandcast_core::calibration::CalibrationTable;
use bandcast_core::estimators::{EmpiricalQuantileEstimator, LinearQuantileEstimator};
use bandcast_core::{CoreError, QuantileEstimator, QuantilePair};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a forecast run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Available quantile estimator implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Linear,
    Empirical,
}

impl EstimatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            EstimatorKind::Linear => "linear",
            EstimatorKind::Empirical => "empirical",
        }
    }

    pub fn build(&self, params: &EstimatorParams) -> Box<dyn QuantileEstimator> {
        match self {
            EstimatorKind::Linear => Box::new(LinearQuantileEstimator::new(
                params.learning_rate,
                params.epochs,
            )),
            EstimatorKind::Empirical => Box::new(EmpiricalQuantileEstimator),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linear" => Some(EstimatorKind::Linear),
            "empirical" => Some(EstimatorKind::Empirical),
            _ => None,
        }
    }
}

/// Which estimators are trained. Only the selected ones are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSelection {
    Single { estimator: EstimatorKind },
    Ensemble { estimators: Vec<EstimatorKind> },
}

impl Default for ModelSelection {
    fn default() -> Self {
        ModelSelection::Ensemble {
            estimators: vec![EstimatorKind::Linear, EstimatorKind::Empirical],
        }
    }
}

impl ModelSelection {
    pub fn estimators(&self) -> Vec<EstimatorKind> {
        match self {
            ModelSelection::Single { estimator } => vec![*estimator],
            ModelSelection::Ensemble { estimators } => estimators.clone(),
        }
    }

    /// Human-readable label, e.g. `linear` or `ensemble(linear+empirical)`.
    pub fn label(&self) -> String {
        match self {
            ModelSelection::Single { estimator } => estimator.name().to_string(),
            ModelSelection::Ensemble { estimators } => {
                let names: Vec<&str> = estimators.iter().map(|e| e.name()).collect();
                format!("ensemble({})", names.join("+"))
            }
        }
    }
}

/// Hyperparameters of the linear estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        let d = LinearQuantileEstimator::default();
        Self {
            learning_rate: d.learning_rate,
            epochs: d.epochs,
        }
    }
}

/// Everything needed to reproduce a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Forecast horizon in trading days; drives calibration.
    pub horizon_days: u32,
    /// Central interval confidence, strictly between 0 and 1.
    pub confidence: f64,
    /// Fraction of labeled rows used for training.
    pub split_ratio: f64,
    /// Minimum labeled rows required to run.
    pub min_rows: usize,
    pub models: ModelSelection,
    pub calibration: CalibrationTable,
    pub estimator: EstimatorParams,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 5,
            confidence: 0.90,
            split_ratio: 0.80,
            min_rows: 200,
            models: ModelSelection::default(),
            calibration: CalibrationTable::default(),
            estimator: EstimatorParams::default(),
        }
    }
}

impl ForecastConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn quantile_pair(&self) -> Result<QuantilePair, ConfigError> {
        Ok(QuantilePair::from_confidence(self.confidence)?)
    }

    /// Reject configurations the pipeline cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quantile_pair()?;
        if self.horizon_days == 0 {
            return Err(ConfigError::Invalid("horizon_days must be positive".into()));
        }
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "split_ratio must lie in (0, 1), got {}",
                self.split_ratio
            )));
        }
        if self.min_rows < 2 {
            return Err(ConfigError::Invalid("min_rows must be at least 2".into()));
        }
        if self.models.estimators().is_empty() {
            return Err(ConfigError::Invalid("ensemble needs at least one estimator".into()));
        }
        if !(self.estimator.learning_rate.is_finite() && self.estimator.learning_rate > 0.0) {
            return Err(ConfigError::Invalid(
                "estimator.learning_rate must be positive".into(),
            ));
        }
        if self.estimator.epochs == 0 {
            return Err(ConfigError::Invalid("estimator.epochs must be positive".into()));
        }
        self.validate_calibration()
    }

    fn validate_calibration(&self) -> Result<(), ConfigError> {
        let table = &self.calibration;
        let factors = table
            .factors
            .iter()
            .map(|f| f.factor)
            .chain(std::iter::once(table.unmapped_factor));
        for factor in factors {
            if !(factor.is_finite() && factor >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "calibration factors must be finite and non-negative, got {factor}"
                )));
            }
        }
        for (i, f) in table.factors.iter().enumerate() {
            if table.factors[..i]
                .iter()
                .any(|g| g.horizon_days == f.horizon_days)
            {
                return Err(ConfigError::Invalid(format!(
                    "duplicate calibration entry for horizon {}",
                    f.horizon_days
                )));
            }
        }
        Ok(())
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share the same RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("ForecastConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}
