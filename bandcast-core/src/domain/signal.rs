//! Signal events emitted by the mean-reversion engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    /// Open a long: price fell below the lower bound.
    Buy,
    /// Open a short: price rose above the upper bound.
    Sell,
    /// Close a long at or above the midpoint.
    ExitLong,
    /// Close a short at or below the midpoint.
    ExitShort,
}

impl SignalKind {
    pub fn is_entry(&self) -> bool {
        matches!(self, SignalKind::Buy | SignalKind::Sell)
    }

    pub fn is_exit(&self) -> bool {
        !self.is_entry()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Buy => "BUY",
            SignalKind::Sell => "SELL",
            SignalKind::ExitLong => "EXIT_LONG",
            SignalKind::ExitShort => "EXIT_SHORT",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable entry in the signal log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub kind: SignalKind,
    pub price: f64,
}

impl Signal {
    pub fn new(date: NaiveDate, kind: SignalKind, price: f64) -> Self {
        Self { date, kind, price }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.kind, self.price, self.date)
    }
}
