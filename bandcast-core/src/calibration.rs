//! Horizon-dependent interval calibration.
//!
//! Raw quantile intervals are systematically over- or under-confident
//! depending on the forecast horizon. Calibration keeps the interval center
//! and rescales its width by a per-horizon factor:
//!
//! ```text
//! center = (low + high) / 2
//! width  = high - low
//! low'   = center - width * factor
//! high'  = center + width * factor
//! ```
//!
//! The factor multiplies the full width on each side of the center, so 0.5 is
//! the identity and 1.0 doubles the interval.
//!
//! Bounds are neither clamped nor reordered. An inverted input (negative
//! width) produces an inverted output.
//!
//! Horizons missing from the table use [`UNMAPPED_HORIZON_FACTOR`], the same
//! multiplier as the 60-day bucket. Whether that widening default is intended
//! or accidental is unresolved, so it is kept as a named, configurable value
//! and every fallback is logged.

use serde::{Deserialize, Serialize};

use crate::domain::{ReturnInterval, ReturnSeries};

/// Factor applied to horizons that have no table entry.
pub const UNMAPPED_HORIZON_FACTOR: f64 = 1.5;

/// One row of the calibration table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonFactor {
    pub horizon_days: u32,
    pub factor: f64,
}

/// Horizon → width multiplier lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    #[serde(default = "default_factors")]
    pub factors: Vec<HorizonFactor>,
    #[serde(default = "default_unmapped_factor")]
    pub unmapped_factor: f64,
}

fn default_unmapped_factor() -> f64 {
    UNMAPPED_HORIZON_FACTOR
}

fn default_factors() -> Vec<HorizonFactor> {
    vec![
        HorizonFactor {
            horizon_days: 5,
            factor: 0.6,
        },
        HorizonFactor {
            horizon_days: 21,
            factor: 1.0,
        },
        HorizonFactor {
            horizon_days: 60,
            factor: 1.5,
        },
    ]
}

impl Default for CalibrationTable {
    /// `5 → 0.6`, `21 → 1.0`, `60 → 1.5`, anything else → 1.5.
    fn default() -> Self {
        Self {
            factors: default_factors(),
            unmapped_factor: UNMAPPED_HORIZON_FACTOR,
        }
    }
}

/// Whether a factor came from the table or from the unmapped default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorSource {
    Mapped,
    /// Horizon not in the table; the unmapped default was used.
    Fallback,
}

/// Result of a factor lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFactor {
    pub horizon_days: u32,
    pub factor: f64,
    pub source: FactorSource,
}

impl CalibrationTable {
    /// Look up the factor for `horizon_days`, logging when the default applies.
    pub fn lookup(&self, horizon_days: u32) -> CalibrationFactor {
        match self.factors.iter().find(|f| f.horizon_days == horizon_days) {
            Some(f) => CalibrationFactor {
                horizon_days,
                factor: f.factor,
                source: FactorSource::Mapped,
            },
            None => {
                tracing::warn!(
                    horizon_days,
                    factor = self.unmapped_factor,
                    "unmapped horizon, using fallback calibration factor"
                );
                CalibrationFactor {
                    horizon_days,
                    factor: self.unmapped_factor,
                    source: FactorSource::Fallback,
                }
            }
        }
    }

    pub fn is_mapped(&self, horizon_days: u32) -> bool {
        self.factors.iter().any(|f| f.horizon_days == horizon_days)
    }
}

/// Recenters and rescales return intervals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntervalCalibrator {
    table: CalibrationTable,
}

impl IntervalCalibrator {
    pub fn new(table: CalibrationTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    pub fn factor(&self, horizon_days: u32) -> CalibrationFactor {
        self.table.lookup(horizon_days)
    }

    pub fn calibrate(&self, interval: ReturnInterval, horizon_days: u32) -> ReturnInterval {
        self.calibrate_with(interval, &self.factor(horizon_days))
    }

    pub fn calibrate_series(&self, series: &ReturnSeries, horizon_days: u32) -> ReturnSeries {
        self.calibrate_series_with(series, &self.factor(horizon_days))
    }

    /// Apply an already looked-up factor, so one run logs a fallback once.
    pub fn calibrate_with(
        &self,
        interval: ReturnInterval,
        factor: &CalibrationFactor,
    ) -> ReturnInterval {
        scale_interval(interval, factor.factor)
    }

    pub fn calibrate_series_with(
        &self,
        series: &ReturnSeries,
        factor: &CalibrationFactor,
    ) -> ReturnSeries {
        series.iter().map(|r| scale_interval(r, factor.factor)).collect()
    }
}

/// Rescale `interval` around its center by `factor`.
pub fn scale_interval(interval: ReturnInterval, factor: f64) -> ReturnInterval {
    let center = interval.center();
    let width = interval.width();
    ReturnInterval::new(center - width * factor, center + width * factor)
}
