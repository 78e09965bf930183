//! Unconditional empirical quantile of the training target.
//!
//! Ignores features entirely. Useful as a baseline and as the starting point
//! for the linear estimator.

use crate::domain::FeatureTable;
use crate::error::CoreError;
use crate::estimator::{check_training_input, ModelHandle, QuantileEstimator};

pub const EMPIRICAL_NAME: &str = "empirical";

#[derive(Debug, Clone, Copy, Default)]
pub struct EmpiricalQuantileEstimator;

impl QuantileEstimator for EmpiricalQuantileEstimator {
    fn name(&self) -> &str {
        EMPIRICAL_NAME
    }

    fn train(
        &self,
        features: &FeatureTable,
        target: &[f64],
        quantile: f64,
    ) -> Result<ModelHandle, CoreError> {
        check_training_input(features, target, quantile)?;
        let value = empirical_quantile(target, quantile).ok_or_else(|| {
            CoreError::estimator(EMPIRICAL_NAME, "target contains non-finite values")
        })?;
        Ok(ModelHandle::new(EMPIRICAL_NAME, quantile, vec![value]))
    }

    fn predict(&self, model: &ModelHandle, features: &FeatureTable) -> Result<Vec<f64>, CoreError> {
        model.ensure_owner(EMPIRICAL_NAME)?;
        let value = model
            .params()
            .first()
            .copied()
            .ok_or_else(|| CoreError::estimator(EMPIRICAL_NAME, "model handle has no parameters"))?;
        Ok(vec![value; features.len()])
    }
}

/// Quantile with linear interpolation between order statistics.
///
/// Returns `None` for empty input or if any value is not finite.
pub fn empirical_quantile(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = quantile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureRow;

    fn features(n: usize) -> FeatureTable {
        vec![FeatureRow::new(100.0, 20.0, 1.0, 0.05, 0.0); n].into()
    }

    #[test]
    fn quantile_interpolates() {
        let values: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
        assert!((empirical_quantile(&values, 0.5).unwrap() - 0.5).abs() < 1e-12);
        assert!((empirical_quantile(&values, 0.05).unwrap() - 0.05).abs() < 1e-12);
        assert!((empirical_quantile(&[1.0, 2.0], 0.25).unwrap() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn quantile_is_order_independent() {
        let a = empirical_quantile(&[3.0, 1.0, 2.0], 0.5);
        assert_eq!(a, Some(2.0));
    }

    #[test]
    fn non_finite_target_fails_training() {
        let err = EmpiricalQuantileEstimator
            .train(&features(2), &[0.1, f64::NAN], 0.5)
            .unwrap_err();
        assert!(matches!(err, CoreError::Estimator { .. }));
    }

    #[test]
    fn predicts_constant_per_row() {
        let target = [0.01, 0.02, 0.03, 0.04, 0.05];
        let model = EmpiricalQuantileEstimator
            .train(&features(5), &target, 0.5)
            .unwrap();
        let preds = EmpiricalQuantileEstimator.predict(&model, &features(3)).unwrap();
        assert_eq!(preds.len(), 3);
        assert!(preds.iter().all(|p| (p - 0.03).abs() < 1e-12));
    }
}
