//! Interval quality metrics — pure functions over aligned arrays.
//!
//! - PICP (coverage): fraction of `actual` inside `[lower, upper]`, inclusive
//!   at both ends. This matches the engine's exit comparison, not its entry
//!   comparison: a price equal to `lower` is covered but does not open a long.
//! - MPIW (average width): mean of `upper - lower`, not clamped, so inverted
//!   intervals pull it down.

use serde::{Deserialize, Serialize};

use crate::engine::BacktestOutcome;
use crate::error::CoreError;

/// Coverage and width of a forecast interval series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalMetrics {
    /// PICP in [0, 1].
    pub coverage: f64,
    /// MPIW.
    pub avg_width: f64,
    pub n_samples: usize,
}

/// Final scores of one backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub coverage: f64,
    pub avg_width: f64,
    pub pnl: f64,
    pub trade_count: usize,
}

impl Metrics {
    pub fn from_parts(interval: &IntervalMetrics, outcome: &BacktestOutcome) -> Self {
        Self {
            coverage: interval.coverage,
            avg_width: interval.avg_width,
            pnl: outcome.realized_pnl,
            trade_count: outcome.trade_count,
        }
    }
}

/// True when `lower <= actual <= upper`.
pub fn is_covered(actual: f64, lower: f64, upper: f64) -> bool {
    lower <= actual && actual <= upper
}

/// Compute PICP and MPIW.
///
/// Fails with `LengthMismatch` if the arrays differ in length and with
/// `EmptyInput` if they are empty.
pub fn evaluate_interval(
    actual: &[f64],
    lower: &[f64],
    upper: &[f64],
) -> Result<IntervalMetrics, CoreError> {
    if actual.len() != lower.len() || actual.len() != upper.len() {
        return Err(CoreError::LengthMismatch {
            lower: lower.len(),
            actual: actual.len(),
            upper: upper.len(),
        });
    }
    if actual.is_empty() {
        return Err(CoreError::EmptyInput {
            context: "interval metrics",
        });
    }

    let n = actual.len();
    let covered = (0..n)
        .filter(|&i| is_covered(actual[i], lower[i], upper[i]))
        .count();
    let width_sum: f64 = lower.iter().zip(upper).map(|(l, u)| u - l).sum();

    Ok(IntervalMetrics {
        coverage: covered as f64 / n as f64,
        avg_width: width_sum / n as f64,
        n_samples: n,
    })
}
