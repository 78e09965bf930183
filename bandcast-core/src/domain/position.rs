//! Position state owned by a single signal-engine run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

/// Where and when the open position was entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    pub price: f64,
}

/// FLAT, LONG or SHORT, carrying the entry for the latter two.
///
/// At most one position is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PositionState {
    #[default]
    Flat,
    Long(Entry),
    Short(Entry),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn side(&self) -> Option<PositionSide> {
        match self {
            PositionState::Flat => None,
            PositionState::Long(_) => Some(PositionSide::Long),
            PositionState::Short(_) => Some(PositionSide::Short),
        }
    }

    pub fn entry(&self) -> Option<Entry> {
        match self {
            PositionState::Flat => None,
            PositionState::Long(e) | PositionState::Short(e) => Some(*e),
        }
    }

    /// Mark-to-market PnL of the open position at `price` (zero when flat).
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self {
            PositionState::Flat => 0.0,
            PositionState::Long(e) => price - e.price,
            PositionState::Short(e) => e.price - price,
        }
    }
}

/// A position still open when the sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub side: PositionSide,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
}
