//! Bandcast Core — probabilistic interval forecasting and mean-reversion trading.
//!
//! This crate contains the pure computational core:
//! - Domain types (feature rows, return/price intervals, signals, position state)
//! - Quantile estimator capability plus two reference estimators
//! - Ensemble combination of per-model intervals
//! - Horizon-dependent interval calibration
//! - Return-space to price-space reconstruction
//! - Mean-reversion signal engine (FLAT/LONG/SHORT state machine)
//! - Interval coverage (PICP) and width (MPIW) metrics
//!
//! No I/O, no rendering, no training of external model families.

pub mod calibration;
pub mod domain;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod estimator;
pub mod estimators;
pub mod metrics;
pub mod reconstruct;

pub use calibration::{
    CalibrationFactor, CalibrationTable, FactorSource, HorizonFactor, IntervalCalibrator,
    UNMAPPED_HORIZON_FACTOR,
};
pub use engine::{BacktestOutcome, IntervalTick, RoundTrip, SignalEngine};
pub use ensemble::{IntervalCombiner, MeanCombiner, WeightedMeanCombiner};
pub use error::CoreError;
pub use estimator::{IntervalModels, ModelHandle, QuantileEstimator, QuantilePair};
pub use metrics::{evaluate_interval, IntervalMetrics, Metrics};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed across batch worker threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::FeatureTable>();
        require_sync::<domain::FeatureTable>();
        require_send::<domain::ReturnSeries>();
        require_sync::<domain::ReturnSeries>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::PositionState>();
        require_sync::<domain::PositionState>();

        // Components
        require_send::<ModelHandle>();
        require_sync::<ModelHandle>();
        require_send::<IntervalCalibrator>();
        require_sync::<IntervalCalibrator>();
        require_send::<estimators::LinearQuantileEstimator>();
        require_sync::<estimators::LinearQuantileEstimator>();
        require_send::<estimators::EmpiricalQuantileEstimator>();
        require_sync::<estimators::EmpiricalQuantileEstimator>();
        require_send::<MeanCombiner>();
        require_sync::<MeanCombiner>();

        // Engine
        require_send::<SignalEngine>();
        require_send::<BacktestOutcome>();
        require_sync::<BacktestOutcome>();
        require_send::<Metrics>();
        require_sync::<Metrics>();
    }

    /// Architecture contract: the estimator capability is object safe, so the
    /// pipeline can hold any model family behind `dyn QuantileEstimator`.
    #[test]
    fn estimator_trait_is_object_safe() {
        let boxed: Vec<Box<dyn QuantileEstimator>> = vec![
            Box::new(estimators::EmpiricalQuantileEstimator),
            Box::new(estimators::LinearQuantileEstimator::default()),
        ];
        let names: Vec<&str> = boxed.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["empirical", "linear"]);
    }

    /// Architecture contract: the signal engine sees only prices and bounds.
    ///
    /// `step()` takes an `IntervalTick` and nothing else, so calibration and
    /// estimator choices cannot leak into trading decisions.
    #[test]
    fn signal_engine_only_sees_ticks() {
        fn _check(engine: &mut SignalEngine, tick: &IntervalTick) -> Option<domain::Signal> {
            engine.step(tick)
        }
    }
}
