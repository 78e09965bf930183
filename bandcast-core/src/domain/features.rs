//! Feature rows: the predictor set consumed by quantile estimators.
//!
//! Rows are produced by an external feature pipeline and are read-only here.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Column names, in the order [`FeatureRow::to_array`] emits them.
pub const FEATURE_COLUMNS: [&str; 5] = ["Close", "VIX", "ATR", "BB_Width", "Return"];

/// Number of predictors per row.
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Predictors for a single time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub close: f64,
    pub vix: f64,
    pub atr: f64,
    pub bb_width: f64,
    #[serde(rename = "return")]
    pub ret: f64,
}

impl FeatureRow {
    pub fn new(close: f64, vix: f64, atr: f64, bb_width: f64, ret: f64) -> Self {
        Self {
            close,
            vix,
            atr,
            bb_width,
            ret,
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [self.close, self.vix, self.atr, self.bb_width, self.ret]
    }

    /// True if any predictor is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.to_array().iter().any(|v| !v.is_finite())
    }
}

/// Chronologically ordered feature rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    /// Copy of the rows in `range`.
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            rows: self.rows[range].to_vec(),
        }
    }

    /// Single-row table, used for the live forecast.
    pub fn single(row: FeatureRow) -> Self {
        Self { rows: vec![row] }
    }

    /// The `Close` column.
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }
}

impl From<Vec<FeatureRow>> for FeatureTable {
    fn from(rows: Vec<FeatureRow>) -> Self {
        Self::new(rows)
    }
}
