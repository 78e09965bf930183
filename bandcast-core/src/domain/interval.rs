//! Interval types in return-space and price-space.
//!
//! Producers do not guarantee `low <= high`. Nothing here reorders or clamps
//! bounds; an inverted interval stays inverted all the way through.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, CoreError};

/// Percentage-return bounds for one time step (0.02 = +2%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnInterval {
    pub low: f64,
    pub high: f64,
}

impl ReturnInterval {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    /// `high - low`; negative when the interval is inverted.
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_inverted(&self) -> bool {
        self.low > self.high
    }
}

/// Absolute price bounds derived from a [`ReturnInterval`] and an anchor price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceInterval {
    pub low_price: f64,
    pub high_price: f64,
}

impl PriceInterval {
    pub fn new(low_price: f64, high_price: f64) -> Self {
        Self {
            low_price,
            high_price,
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.low_price + self.high_price) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.high_price - self.low_price
    }
}

/// Per-step return intervals stored column-wise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl ReturnSeries {
    /// Build a series, failing if the two columns differ in length.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self, CoreError> {
        ensure_len("return series", low.len(), high.len())?;
        Ok(Self { low, high })
    }

    /// One-step series from a scalar interval.
    pub fn from_interval(interval: ReturnInterval) -> Self {
        Self {
            low: vec![interval.low],
            high: vec![interval.high],
        }
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn get(&self, i: usize) -> Option<ReturnInterval> {
        Some(ReturnInterval::new(*self.low.get(i)?, *self.high.get(i)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = ReturnInterval> + '_ {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&low, &high)| ReturnInterval::new(low, high))
    }

    pub fn last(&self) -> Option<ReturnInterval> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn midpoints(&self) -> Vec<f64> {
        self.iter().map(|r| r.center()).collect()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.iter().map(|r| r.width()).collect()
    }
}

impl FromIterator<ReturnInterval> for ReturnSeries {
    fn from_iter<I: IntoIterator<Item = ReturnInterval>>(iter: I) -> Self {
        let (low, high) = iter.into_iter().map(|r| (r.low, r.high)).unzip();
        Self { low, high }
    }
}

/// Per-step price intervals stored column-wise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl PriceSeries {
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self, CoreError> {
        ensure_len("price series", low.len(), high.len())?;
        Ok(Self { low, high })
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn get(&self, i: usize) -> Option<PriceInterval> {
        Some(PriceInterval::new(*self.low.get(i)?, *self.high.get(i)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = PriceInterval> + '_ {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&low, &high)| PriceInterval::new(low, high))
    }

    pub fn midpoints(&self) -> Vec<f64> {
        self.iter().map(|p| p.midpoint()).collect()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.iter().map(|p| p.width()).collect()
    }
}

impl FromIterator<PriceInterval> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PriceInterval>>(iter: I) -> Self {
        let (low, high) = iter
            .into_iter()
            .map(|p| (p.low_price, p.high_price))
            .unzip();
        Self { low, high }
    }
}
