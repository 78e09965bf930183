//! Forecast pipeline. Wires estimators, ensemble, calibration, price
//! reconstruction, the signal engine, and metrics into one run.
//!
//! Two entry points:
//! - `run_forecast()`: the default mean ensemble. Used by the CLI and batch runs.
//! - `run_forecast_with()`: takes an explicit [`IntervalCombiner`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bandcast_core::calibration::{CalibrationFactor, IntervalCalibrator};
use bandcast_core::domain::{FeatureTable, ReturnInterval, ReturnSeries, SignalKind};
use bandcast_core::engine::{run_mean_reversion, BacktestOutcome};
use bandcast_core::ensemble::{IntervalCombiner, MeanCombiner};
use bandcast_core::estimator::IntervalModels;
use bandcast_core::metrics::{evaluate_interval, Metrics};
use bandcast_core::reconstruct::{to_price_interval, to_price_series, to_prices};
use bandcast_core::CoreError;

use crate::config::{ConfigError, EstimatorKind, ForecastConfig, RunId};
use crate::dataset::{Dataset, DatasetError};

/// Errors from the pipeline.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Live forecast for the newest row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointForecast {
    /// Date of the newest row.
    pub as_of: NaiveDate,
    /// `as_of` plus the horizon in calendar days.
    pub target_date: NaiveDate,
    pub anchor_price: f64,
    pub return_low: f64,
    pub return_high: f64,
    pub price_low: f64,
    pub price_high: f64,
}

/// One test-period step as fed to the signal engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub actual: f64,
    pub price_low: f64,
    pub price_high: f64,
}

/// Complete result of a single forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub dataset_hash: String,
    pub horizon_days: u32,
    pub confidence: f64,
    pub models: Vec<EstimatorKind>,
    pub combiner: String,
    pub calibration: CalibrationFactor,
    pub train_rows: usize,
    pub point: PointForecast,
    pub backtest: Vec<BacktestRow>,
    pub outcome: BacktestOutcome,
    pub metrics: Metrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ForecastReport {
    /// Signal emitted on the last backtest date, if any.
    pub fn current_signal(&self) -> Option<SignalKind> {
        let last = self.backtest.last()?;
        self.outcome.signal_on(last.date).map(|s| s.kind)
    }

    pub fn test_rows(&self) -> usize {
        self.backtest.len()
    }
}

/// Run a forecast with the mean ensemble.
pub fn run_forecast(
    symbol: &str,
    dataset: &Dataset,
    config: &ForecastConfig,
) -> Result<ForecastReport, RunError> {
    run_forecast_with(symbol, dataset, config, &MeanCombiner)
}

/// Run a forecast with an explicit combiner.
pub fn run_forecast_with(
    symbol: &str,
    dataset: &Dataset,
    config: &ForecastConfig,
    combiner: &dyn IntervalCombiner,
) -> Result<ForecastReport, RunError> {
    config.validate()?;
    let pair = config.quantile_pair()?;

    dataset.ensure_rows(config.min_rows)?;
    dataset.ensure_finite()?;
    let split = dataset.split(config.split_ratio)?;
    let (as_of, latest) = dataset.latest().ok_or(CoreError::EmptyInput {
        context: "dataset",
    })?;
    let live = FeatureTable::single(latest);

    tracing::debug!(
        symbol,
        train = split.train_features.len(),
        test = split.test_features.len(),
        "split dataset"
    );

    // Only the selected estimators are trained.
    let kinds = config.models.estimators();
    let mut test_forecasts: Vec<ReturnSeries> = Vec::with_capacity(kinds.len());
    let mut point_forecasts: Vec<ReturnInterval> = Vec::with_capacity(kinds.len());
    for kind in &kinds {
        let estimator = kind.build(&config.estimator);
        let models = IntervalModels::train(
            estimator.as_ref(),
            &split.train_features,
            &split.train_target,
            pair,
        )?;
        test_forecasts.push(models.predict(estimator.as_ref(), &split.test_features)?);
        let point = models
            .predict(estimator.as_ref(), &live)?
            .last()
            .ok_or(CoreError::EmptyInput {
                context: "live forecast",
            })?;
        point_forecasts.push(point);
    }

    let combined = combiner.combine(&test_forecasts)?;
    let combined_point = combiner.combine_point(&point_forecasts)?;

    // One lookup per run so an unmapped horizon is logged once.
    let calibrator = IntervalCalibrator::new(config.calibration.clone());
    let calibration = calibrator.factor(config.horizon_days);
    let calibrated = calibrator.calibrate_series_with(&combined, &calibration);
    let calibrated_point = calibrator.calibrate_with(combined_point, &calibration);

    let anchors = split.test_features.closes();
    let prices = to_price_series(&anchors, &calibrated)?;
    let actual = to_prices(&anchors, &split.test_target)?;

    let outcome = run_mean_reversion(&split.test_dates, &actual, prices.low(), prices.high())?;
    let interval_metrics = evaluate_interval(&actual, prices.low(), prices.high())?;
    let metrics = Metrics::from_parts(&interval_metrics, &outcome);

    let point_prices = to_price_interval(latest.close, calibrated_point);
    let point = PointForecast {
        as_of,
        target_date: as_of + chrono::Duration::days(i64::from(config.horizon_days)),
        anchor_price: latest.close,
        return_low: calibrated_point.low,
        return_high: calibrated_point.high,
        price_low: point_prices.low_price,
        price_high: point_prices.high_price,
    };

    let backtest = split
        .test_dates
        .iter()
        .zip(&actual)
        .zip(prices.iter())
        .map(|((&date, &actual), band)| BacktestRow {
            date,
            actual,
            price_low: band.low_price,
            price_high: band.high_price,
        })
        .collect();

    tracing::info!(
        symbol,
        models = %config.models.label(),
        coverage = metrics.coverage,
        avg_width = metrics.avg_width,
        pnl = metrics.pnl,
        trades = metrics.trade_count,
        "forecast complete"
    );

    Ok(ForecastReport {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        symbol: symbol.to_string(),
        dataset_hash: dataset.fingerprint(),
        horizon_days: config.horizon_days,
        confidence: config.confidence,
        models: kinds,
        combiner: combiner.name().to_string(),
        calibration,
        train_rows: split.train_features.len(),
        point,
        backtest,
        outcome,
        metrics,
    })
}
