//! Quantile estimator capability.
//!
//! The core depends only on this interface: `train` turns a feature table, a
//! target and a quantile level into an opaque [`ModelHandle`]; `predict` maps a
//! handle and a feature table to one return estimate per row. Which model
//! family sits behind it is invisible to calibration and signal logic.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureTable, ReturnSeries};
use crate::error::{ensure_len, CoreError};

/// Symmetric lower/upper quantile levels for a central interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantilePair {
    pub lower: f64,
    pub upper: f64,
}

impl QuantilePair {
    /// `lower = (1 - confidence) / 2`, `upper = 1 - lower`.
    ///
    /// Confidence must lie strictly between 0 and 1.
    pub fn from_confidence(confidence: f64) -> Result<Self, CoreError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(CoreError::InvalidConfidence(confidence));
        }
        let lower = (1.0 - confidence) / 2.0;
        Ok(Self {
            lower,
            upper: 1.0 - lower,
        })
    }

    pub fn confidence(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Opaque trained model produced by a [`QuantileEstimator`].
///
/// Only the estimator that produced a handle knows how to read `params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHandle {
    estimator: String,
    quantile: f64,
    params: Vec<f64>,
}

impl ModelHandle {
    pub fn new(estimator: impl Into<String>, quantile: f64, params: Vec<f64>) -> Self {
        Self {
            estimator: estimator.into(),
            quantile,
            params,
        }
    }

    pub fn estimator(&self) -> &str {
        &self.estimator
    }

    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Reject handles trained by a different estimator.
    pub fn ensure_owner(&self, name: &str) -> Result<(), CoreError> {
        if self.estimator != name {
            return Err(CoreError::estimator(
                name,
                format!("model handle was trained by '{}'", self.estimator),
            ));
        }
        Ok(())
    }
}

/// Trains and evaluates single-quantile return models.
///
/// # Invariants
/// - `train` and `predict` are synchronous and return complete results
/// - `predict` returns exactly one value per feature row
pub trait QuantileEstimator: Send + Sync {
    /// Estimator name for logging and handle ownership checks.
    fn name(&self) -> &str;

    fn train(
        &self,
        features: &FeatureTable,
        target: &[f64],
        quantile: f64,
    ) -> Result<ModelHandle, CoreError>;

    fn predict(&self, model: &ModelHandle, features: &FeatureTable) -> Result<Vec<f64>, CoreError>;
}

/// Shared precondition check for `train` implementations.
pub fn check_training_input(
    features: &FeatureTable,
    target: &[f64],
    quantile: f64,
) -> Result<(), CoreError> {
    if !(quantile > 0.0 && quantile < 1.0) {
        return Err(CoreError::InvalidQuantile(quantile));
    }
    if features.is_empty() {
        return Err(CoreError::EmptyInput {
            context: "training features",
        });
    }
    ensure_len("training target", features.len(), target.len())
}

/// Lower and upper models from one estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalModels {
    pub low: ModelHandle,
    pub high: ModelHandle,
}

impl IntervalModels {
    /// Train both quantile models of `pair`.
    pub fn train(
        estimator: &dyn QuantileEstimator,
        features: &FeatureTable,
        target: &[f64],
        pair: QuantilePair,
    ) -> Result<Self, CoreError> {
        let low = estimator.train(features, target, pair.lower)?;
        let high = estimator.train(features, target, pair.upper)?;
        tracing::debug!(
            estimator = estimator.name(),
            rows = features.len(),
            lower = pair.lower,
            upper = pair.upper,
            "trained interval models"
        );
        Ok(Self { low, high })
    }

    /// Predict a return interval for every row of `features`.
    pub fn predict(
        &self,
        estimator: &dyn QuantileEstimator,
        features: &FeatureTable,
    ) -> Result<ReturnSeries, CoreError> {
        let low = estimator.predict(&self.low, features)?;
        let high = estimator.predict(&self.high, features)?;
        ensure_len("estimator low output", features.len(), low.len())?;
        ensure_len("estimator high output", features.len(), high.len())?;
        ReturnSeries::new(low, high)
    }
}
