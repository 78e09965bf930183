//! Linear quantile regression fitted by subgradient descent on pinball loss.
//!
//! Features are z-scored with training statistics, which are stored in the
//! model handle so prediction applies the same transform. Fitting is
//! full-batch and deterministic.
//!
//! Handle layout: `[mean; 5] ++ [std; 5] ++ [intercept] ++ [weight; 5]`.

use crate::domain::{FeatureRow, FeatureTable, FEATURE_COUNT};
use crate::error::CoreError;
use crate::estimator::{check_training_input, ModelHandle, QuantileEstimator};
use crate::estimators::empirical::empirical_quantile;

pub const LINEAR_NAME: &str = "linear";

const PARAM_LEN: usize = 3 * FEATURE_COUNT + 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearQuantileEstimator {
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for LinearQuantileEstimator {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epochs: 500,
        }
    }
}

impl LinearQuantileEstimator {
    pub fn new(learning_rate: f64, epochs: usize) -> Self {
        Self {
            learning_rate,
            epochs,
        }
    }
}

/// Pinball (quantile) loss of a single residual `e = y - prediction`.
pub fn pinball_loss(quantile: f64, residual: f64) -> f64 {
    (quantile * residual).max((quantile - 1.0) * residual)
}

impl QuantileEstimator for LinearQuantileEstimator {
    fn name(&self) -> &str {
        LINEAR_NAME
    }

    fn train(
        &self,
        features: &FeatureTable,
        target: &[f64],
        quantile: f64,
    ) -> Result<ModelHandle, CoreError> {
        check_training_input(features, target, quantile)?;
        if features.rows().iter().any(FeatureRow::has_non_finite) {
            return Err(CoreError::estimator(LINEAR_NAME, "features contain non-finite values"));
        }
        let intercept0 = empirical_quantile(target, quantile)
            .ok_or_else(|| CoreError::estimator(LINEAR_NAME, "target contains non-finite values"))?;

        let (mean, std) = column_stats(features);
        let z: Vec<[f64; FEATURE_COUNT]> = features
            .rows()
            .iter()
            .map(|r| standardize(r, &mean, &std))
            .collect();

        let n = z.len() as f64;
        let mut intercept = intercept0;
        let mut weights = [0.0; FEATURE_COUNT];

        for _ in 0..self.epochs {
            let mut grad_b = 0.0;
            let mut grad_w = [0.0; FEATURE_COUNT];
            for (zi, &yi) in z.iter().zip(target) {
                let residual = yi - (intercept + dot(&weights, zi));
                // d(loss)/d(prediction) = -d(loss)/d(residual)
                let g = if residual > 0.0 {
                    -quantile
                } else if residual < 0.0 {
                    1.0 - quantile
                } else {
                    0.0
                };
                grad_b += g;
                for (gw, x) in grad_w.iter_mut().zip(zi) {
                    *gw += g * x;
                }
            }
            intercept -= self.learning_rate * grad_b / n;
            for (w, gw) in weights.iter_mut().zip(grad_w) {
                *w -= self.learning_rate * gw / n;
            }
        }

        let mut params = Vec::with_capacity(PARAM_LEN);
        params.extend_from_slice(&mean);
        params.extend_from_slice(&std);
        params.push(intercept);
        params.extend_from_slice(&weights);
        Ok(ModelHandle::new(LINEAR_NAME, quantile, params))
    }

    fn predict(&self, model: &ModelHandle, features: &FeatureTable) -> Result<Vec<f64>, CoreError> {
        model.ensure_owner(LINEAR_NAME)?;
        let p = model.params();
        if p.len() != PARAM_LEN {
            return Err(CoreError::estimator(
                LINEAR_NAME,
                format!("expected {PARAM_LEN} parameters, got {}", p.len()),
            ));
        }
        let mut mean = [0.0; FEATURE_COUNT];
        let mut std = [0.0; FEATURE_COUNT];
        let mut weights = [0.0; FEATURE_COUNT];
        mean.copy_from_slice(&p[..FEATURE_COUNT]);
        std.copy_from_slice(&p[FEATURE_COUNT..2 * FEATURE_COUNT]);
        let intercept = p[2 * FEATURE_COUNT];
        weights.copy_from_slice(&p[2 * FEATURE_COUNT + 1..]);

        Ok(features
            .rows()
            .iter()
            .map(|r| intercept + dot(&weights, &standardize(r, &mean, &std)))
            .collect())
    }
}

fn column_stats(features: &FeatureTable) -> ([f64; FEATURE_COUNT], [f64; FEATURE_COUNT]) {
    let n = features.len() as f64;
    let mut mean = [0.0; FEATURE_COUNT];
    for row in features.rows() {
        for (m, v) in mean.iter_mut().zip(row.to_array()) {
            *m += v / n;
        }
    }
    let mut var = [0.0; FEATURE_COUNT];
    for row in features.rows() {
        for ((s, v), m) in var.iter_mut().zip(row.to_array()).zip(mean) {
            *s += (v - m).powi(2) / n;
        }
    }
    // Constant columns standardize to zero instead of dividing by zero.
    let std = var.map(|v| if v.sqrt() < 1e-12 { 1.0 } else { v.sqrt() });
    (mean, std)
}

fn standardize(
    row: &FeatureRow,
    mean: &[f64; FEATURE_COUNT],
    std: &[f64; FEATURE_COUNT],
) -> [f64; FEATURE_COUNT] {
    let mut z = row.to_array();
    for ((v, m), s) in z.iter_mut().zip(mean).zip(std) {
        *v = (*v - m) / s;
    }
    z
}

fn dot(a: &[f64; FEATURE_COUNT], b: &[f64; FEATURE_COUNT]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
