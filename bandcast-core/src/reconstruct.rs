//! Return-space → price-space reconstruction.
//!
//! `price = anchor * (1 + return)`, elementwise when the anchor is a series.

use crate::domain::{PriceInterval, PriceSeries, ReturnInterval, ReturnSeries};
use crate::error::{ensure_len, CoreError};

pub fn price_from_return(anchor: f64, ret: f64) -> f64 {
    anchor * (1.0 + ret)
}

/// Inverse of [`price_from_return`].
pub fn return_from_price(anchor: f64, price: f64) -> f64 {
    price / anchor - 1.0
}

/// Price interval for a single anchor (the live forecast).
pub fn to_price_interval(anchor: f64, interval: ReturnInterval) -> PriceInterval {
    PriceInterval::new(
        price_from_return(anchor, interval.low),
        price_from_return(anchor, interval.high),
    )
}

/// Price intervals for an aligned anchor series (backtests).
pub fn to_price_series(anchors: &[f64], series: &ReturnSeries) -> Result<PriceSeries, CoreError> {
    ensure_len("price anchors", anchors.len(), series.len())?;
    Ok(anchors
        .iter()
        .zip(series.iter())
        .map(|(&a, r)| to_price_interval(a, r))
        .collect())
}

/// Point values (e.g. realised returns) mapped through aligned anchors.
pub fn to_prices(anchors: &[f64], returns: &[f64]) -> Result<Vec<f64>, CoreError> {
    ensure_len("price anchors", anchors.len(), returns.len())?;
    Ok(anchors
        .iter()
        .zip(returns)
        .map(|(&a, &r)| price_from_return(a, r))
        .collect())
}
