//! Completed entry/exit pairs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Entry, PositionSide};

/// A closed position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub side: PositionSide,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub pnl: f64,
}

impl RoundTrip {
    /// Close `entry` at `exit_price`. PnL is per unit, long or short.
    pub fn close(side: PositionSide, entry: Entry, exit_date: NaiveDate, exit_price: f64) -> Self {
        let pnl = match side {
            PositionSide::Long => exit_price - entry.price,
            PositionSide::Short => entry.price - exit_price,
        };
        Self {
            side,
            entry_date: entry.date,
            entry_price: entry.price,
            exit_date,
            exit_price,
            pnl,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    /// Calendar days between entry and exit.
    pub fn days_held(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
