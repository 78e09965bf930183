//! Mean-reversion signal engine — a FLAT/LONG/SHORT state machine.
//!
//! One evaluation per tick, in order, with `midpoint = (lower + upper) / 2`.
//! At most one transition fires per tick, checked in this priority:
//!
//! | from  | condition            | to    | signal       | pnl                    |
//! |-------|----------------------|-------|--------------|------------------------|
//! | FLAT  | `actual < lower`     | LONG  | `BUY`        |                        |
//! | FLAT  | `actual > upper`     | SHORT | `SELL`       |                        |
//! | LONG  | `actual >= midpoint` | FLAT  | `EXIT_LONG`  | `+= actual - entry`    |
//! | SHORT | `actual <= midpoint` | FLAT  | `EXIT_SHORT` | `+= entry - actual`    |
//!
//! Entries compare strictly and exits inclusively: a price equal to a bound
//! never opens a position but a price equal to the midpoint closes one.
//! A position still open at the end of the sequence stays open and its
//! unrealized PnL is not counted. NaN prices or bounds never trigger anything.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Entry, OpenPosition, PositionSide, PositionState, Signal, SignalKind};
use crate::engine::round_trip::RoundTrip;
use crate::error::{ensure_len, CoreError};

/// One timestep of the backtest series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalTick {
    pub date: NaiveDate,
    pub actual: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IntervalTick {
    pub fn new(date: NaiveDate, actual: f64, lower: f64, upper: f64) -> Self {
        Self {
            date,
            actual,
            lower,
            upper,
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    /// Ordered signal log.
    pub signals: Vec<Signal>,
    /// Sum of PnL over closed positions only.
    pub realized_pnl: f64,
    /// Number of signals emitted (entries and exits).
    pub trade_count: usize,
    pub round_trips: Vec<RoundTrip>,
    /// Position left open when the sequence ended.
    pub open_position: Option<OpenPosition>,
}

impl BacktestOutcome {
    /// Fraction of closed round trips with positive PnL.
    pub fn win_rate(&self) -> f64 {
        if self.round_trips.is_empty() {
            return 0.0;
        }
        let wins = self.round_trips.iter().filter(|t| t.is_winner()).count();
        wins as f64 / self.round_trips.len() as f64
    }

    /// Last emitted signal, if it happened on `date`.
    pub fn signal_on(&self, date: NaiveDate) -> Option<&Signal> {
        self.signals.last().filter(|s| s.date == date)
    }
}

/// Stateful engine for a single run.
///
/// The position state belongs to this instance alone. Concurrent backtests
/// each need their own engine.
#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    state: PositionState,
    signals: Vec<Signal>,
    realized_pnl: f64,
    round_trips: Vec<RoundTrip>,
}

impl SignalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Back to FLAT with empty logs.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Evaluate one tick; returns the signal if a transition fired.
    pub fn step(&mut self, tick: &IntervalTick) -> Option<Signal> {
        let price = tick.actual;
        let current = self.state;
        let (next, kind) = match current {
            PositionState::Flat if price < tick.lower => (
                PositionState::Long(Entry {
                    date: tick.date,
                    price,
                }),
                SignalKind::Buy,
            ),
            PositionState::Flat if price > tick.upper => (
                PositionState::Short(Entry {
                    date: tick.date,
                    price,
                }),
                SignalKind::Sell,
            ),
            PositionState::Long(entry) if price >= tick.midpoint() => {
                self.close(PositionSide::Long, entry, tick);
                (PositionState::Flat, SignalKind::ExitLong)
            }
            PositionState::Short(entry) if price <= tick.midpoint() => {
                self.close(PositionSide::Short, entry, tick);
                (PositionState::Flat, SignalKind::ExitShort)
            }
            _ => return None,
        };

        self.state = next;
        let signal = Signal::new(tick.date, kind, price);
        tracing::trace!(%signal, pnl = self.realized_pnl, "transition");
        self.signals.push(signal);
        Some(signal)
    }

    fn close(&mut self, side: PositionSide, entry: Entry, tick: &IntervalTick) {
        let trip = RoundTrip::close(side, entry, tick.date, tick.actual);
        self.realized_pnl += trip.pnl;
        self.round_trips.push(trip);
    }

    /// Snapshot of the current logs and open position.
    pub fn outcome(&self) -> BacktestOutcome {
        let open_position = match self.state {
            PositionState::Flat => None,
            PositionState::Long(e) => Some((PositionSide::Long, e)),
            PositionState::Short(e) => Some((PositionSide::Short, e)),
        }
        .map(|(side, e)| OpenPosition {
            side,
            entry_date: e.date,
            entry_price: e.price,
        });

        BacktestOutcome {
            signals: self.signals.clone(),
            realized_pnl: self.realized_pnl,
            trade_count: self.signals.len(),
            round_trips: self.round_trips.clone(),
            open_position,
        }
    }

    /// Reset, then fold every tick in order.
    pub fn run<I>(&mut self, ticks: I) -> BacktestOutcome
    where
        I: IntoIterator<Item = IntervalTick>,
    {
        self.reset();
        for tick in ticks {
            self.step(&tick);
        }
        self.outcome()
    }
}

/// Zip aligned columns into ticks, failing on any length mismatch.
pub fn build_ticks(
    dates: &[NaiveDate],
    actual: &[f64],
    lower: &[f64],
    upper: &[f64],
) -> Result<Vec<IntervalTick>, CoreError> {
    ensure_len("tick actual", dates.len(), actual.len())?;
    ensure_len("tick lower", dates.len(), lower.len())?;
    ensure_len("tick upper", dates.len(), upper.len())?;
    Ok((0..dates.len())
        .map(|i| IntervalTick::new(dates[i], actual[i], lower[i], upper[i]))
        .collect())
}

/// Run a fresh engine over aligned columns.
pub fn run_mean_reversion(
    dates: &[NaiveDate],
    actual: &[f64],
    lower: &[f64],
    upper: &[f64],
) -> Result<BacktestOutcome, CoreError> {
    let ticks = build_ticks(dates, actual, lower, upper)?;
    Ok(SignalEngine::new().run(ticks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(i: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1 + i).unwrap()
    }

    fn tick(i: u32, actual: f64) -> IntervalTick {
        IntervalTick::new(day(i), actual, 10.0, 12.0)
    }

    #[test]
    fn buy_then_exit_long() {
        let mut engine = SignalEngine::new();
        assert_eq!(engine.step(&tick(0, 9.0)).map(|s| s.kind), Some(SignalKind::Buy));
        assert!(matches!(engine.state(), PositionState::Long(_)));
        assert_eq!(
            engine.step(&tick(1, 11.0)).map(|s| s.kind),
            Some(SignalKind::ExitLong)
        );
        assert!(engine.state().is_flat());
        assert_eq!(engine.realized_pnl(), 2.0);
    }

    #[test]
    fn sell_then_exit_short() {
        let mut engine = SignalEngine::new();
        assert_eq!(engine.step(&tick(0, 13.0)).map(|s| s.kind), Some(SignalKind::Sell));
        assert_eq!(engine.step(&tick(1, 11.5)), None);
        assert_eq!(
            engine.step(&tick(2, 11.0)).map(|s| s.kind),
            Some(SignalKind::ExitShort)
        );
        assert_eq!(engine.realized_pnl(), 2.0);
    }

    #[test]
    fn bounds_do_not_trigger_entry() {
        let mut engine = SignalEngine::new();
        assert_eq!(engine.step(&tick(0, 10.0)), None);
        assert_eq!(engine.step(&tick(1, 12.0)), None);
        assert!(engine.state().is_flat());
    }

    #[test]
    fn only_one_transition_per_tick() {
        // Long entry at 9; next tick is far above upper: exit only, no SELL.
        let mut engine = SignalEngine::new();
        engine.step(&tick(0, 9.0));
        let s = engine.step(&tick(1, 20.0)).unwrap();
        assert_eq!(s.kind, SignalKind::ExitLong);
        assert!(engine.state().is_flat());
        assert_eq!(engine.signals().len(), 2);
    }

    #[test]
    fn long_holds_below_midpoint() {
        let mut engine = SignalEngine::new();
        engine.step(&tick(0, 9.0));
        assert_eq!(engine.step(&tick(1, 8.0)), None);
        assert_eq!(engine.step(&tick(2, 10.99)), None);
        assert!(matches!(engine.state(), PositionState::Long(_)));
    }

    #[test]
    fn nan_never_triggers() {
        let mut engine = SignalEngine::new();
        assert_eq!(engine.step(&tick(0, f64::NAN)), None);
        assert_eq!(engine.step(&IntervalTick::new(day(1), 5.0, f64::NAN, f64::NAN)), None);
    }

    #[test]
    fn run_resets_previous_state() {
        let mut engine = SignalEngine::new();
        engine.step(&tick(0, 9.0));
        let out = engine.run(vec![tick(1, 11.0)]);
        assert!(out.signals.is_empty());
        assert_eq!(out.realized_pnl, 0.0);
        assert!(out.open_position.is_none());
    }

    #[test]
    fn build_ticks_checks_lengths() {
        let dates = [day(0), day(1)];
        assert!(build_ticks(&dates, &[1.0, 2.0], &[0.0], &[3.0, 3.0]).is_err());
        assert_eq!(
            build_ticks(&dates, &[1.0, 2.0], &[0.0, 0.0], &[3.0, 3.0])
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn win_rate_counts_closed_trips() {
        let out = SignalEngine::new().run(vec![
            tick(0, 9.0),
            tick(1, 11.0),  // +2
            tick(2, 13.0),  // sell
            tick(3, 11.0),  // +2
            tick(4, 9.5),   // buy
            tick(5, 11.0),  // +1.5
        ]);
        assert_eq!(out.round_trips.len(), 3);
        assert_eq!(out.win_rate(), 1.0);
        assert!((out.realized_pnl - 5.5).abs() < 1e-12);
    }
}
