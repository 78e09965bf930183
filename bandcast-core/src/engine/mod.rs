//! Backtest engine: the mean-reversion state machine and its outputs.

pub mod round_trip;
pub mod signal_engine;

pub use round_trip::RoundTrip;
pub use signal_engine::{
    build_ticks, run_mean_reversion, BacktestOutcome, IntervalTick, SignalEngine,
};
