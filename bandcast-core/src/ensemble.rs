//! Ensemble combination of per-model interval forecasts.
//!
//! Callers depend on the [`IntervalCombiner`] trait, so the arithmetic mean can
//! be swapped for a weighted or learned combination without touching them.

use crate::domain::{ReturnInterval, ReturnSeries};
use crate::error::{ensure_len, CoreError};

/// Merges N >= 1 equally long interval forecasts into one.
pub trait IntervalCombiner: Send + Sync {
    fn name(&self) -> &str;

    /// Combine per-model series. Lows and highs are combined separately.
    fn combine(&self, sources: &[ReturnSeries]) -> Result<ReturnSeries, CoreError>;

    /// Combine single-step forecasts.
    fn combine_point(&self, sources: &[ReturnInterval]) -> Result<ReturnInterval, CoreError> {
        let series: Vec<ReturnSeries> = sources
            .iter()
            .copied()
            .map(ReturnSeries::from_interval)
            .collect();
        self.combine(&series)?
            .last()
            .ok_or(CoreError::EmptyInput {
                context: "ensemble sources",
            })
    }
}

/// Elementwise arithmetic mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanCombiner;

impl IntervalCombiner for MeanCombiner {
    fn name(&self) -> &str {
        "mean"
    }

    fn combine(&self, sources: &[ReturnSeries]) -> Result<ReturnSeries, CoreError> {
        let weights = vec![1.0 / sources.len().max(1) as f64; sources.len()];
        weighted_combine(sources, &weights)
    }
}

/// Elementwise weighted mean; weights are normalised to sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedMeanCombiner {
    weights: Vec<f64>,
}

impl WeightedMeanCombiner {
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl IntervalCombiner for WeightedMeanCombiner {
    fn name(&self) -> &str {
        "weighted_mean"
    }

    fn combine(&self, sources: &[ReturnSeries]) -> Result<ReturnSeries, CoreError> {
        ensure_len("ensemble weights", sources.len(), self.weights.len())?;
        let total: f64 = self.weights.iter().sum();
        if total.abs() < 1e-15 {
            return Err(CoreError::EmptyInput {
                context: "ensemble weights sum to zero",
            });
        }
        let normalised: Vec<f64> = self.weights.iter().map(|w| w / total).collect();
        weighted_combine(sources, &normalised)
    }
}

fn weighted_combine(sources: &[ReturnSeries], weights: &[f64]) -> Result<ReturnSeries, CoreError> {
    let first = sources.first().ok_or(CoreError::EmptyInput {
        context: "ensemble sources",
    })?;
    let len = first.len();
    for s in &sources[1..] {
        ensure_len("ensemble source", len, s.len())?;
    }

    let mut low = vec![0.0; len];
    let mut high = vec![0.0; len];
    for (source, &w) in sources.iter().zip(weights) {
        for (acc, v) in low.iter_mut().zip(source.low()) {
            *acc += w * v;
        }
        for (acc, v) in high.iter_mut().zip(source.high()) {
            *acc += w * v;
        }
    }
    ReturnSeries::new(low, high)
}
