//! Bandcast Runner — forecast orchestration, datasets, batch runs, export.
//!
//! This crate builds on `bandcast-core` to provide:
//! - TOML forecast configuration with content-addressed run ids
//! - CSV feature/target dataset loading plus a synthetic generator
//! - The end-to-end forecast pipeline (train, combine, calibrate, backtest)
//! - Parallel watchlist runs
//! - JSON/CSV artifact export

pub mod batch;
pub mod config;
pub mod dataset;
pub mod export;
pub mod pipeline;

pub use batch::{load_watchlist_dir, run_watchlist, WatchlistEntry, WatchlistInput};
pub use config::{ConfigError, EstimatorKind, EstimatorParams, ForecastConfig, ModelSelection};
pub use dataset::{Dataset, DatasetError, Split};
pub use export::{
    export_backtest_csv, export_report_json, export_round_trips_csv, export_signals_csv,
    import_report_json, load_artifacts, save_artifacts,
};
pub use pipeline::{
    run_forecast, run_forecast_with, BacktestRow, ForecastReport, PointForecast, RunError,
    SCHEMA_VERSION,
};
