//! Report export — JSON and CSV artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: backtest band, signal log, and closed round trips
//!
//! Persisted reports carry a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bandcast_core::domain::Signal;
use bandcast_core::engine::RoundTrip;

use crate::pipeline::{BacktestRow, ForecastReport, SCHEMA_VERSION};

/// Characters of the run id used in artifact directory names.
const RUN_ID_PREFIX_LEN: usize = 12;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_report_json(report: &ForecastReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ForecastReport to JSON")
}

/// Deserialize a `ForecastReport`, rejecting unknown schema versions.
pub fn import_report_json(json: &str) -> Result<ForecastReport> {
    let report: ForecastReport =
        serde_json::from_str(json).context("failed to deserialize ForecastReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: date, actual, price_low, price_high
pub fn export_backtest_csv(rows: &[BacktestRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "actual", "price_low", "price_high"])?;
    for r in rows {
        wtr.write_record([
            r.date.to_string(),
            format!("{:.6}", r.actual),
            format!("{:.6}", r.price_low),
            format!("{:.6}", r.price_high),
        ])?;
    }
    finish(wtr)
}

/// Columns: date, kind, price
pub fn export_signals_csv(signals: &[Signal]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "kind", "price"])?;
    for s in signals {
        wtr.write_record([
            s.date.to_string(),
            s.kind.as_str().to_string(),
            format!("{:.6}", s.price),
        ])?;
    }
    finish(wtr)
}

/// Columns: side, entry_date, entry_price, exit_date, exit_price, pnl
pub fn export_round_trips_csv(trips: &[RoundTrip]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "pnl",
    ])?;
    for t in trips {
        wtr.write_record([
            format!("{:?}", t.side),
            t.entry_date.to_string(),
            format!("{:.6}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.6}", t.exit_price),
            format!("{:.6}", t.pnl),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

// ─── Artifact directory ─────────────────────────────────────────────

/// Write a report's artifacts under `<output_dir>/<symbol>-<run id prefix>/`:
///
/// - `report.json`: full report
/// - `backtest.csv`: test-period price band
/// - `signals.csv`: signal log
/// - `round_trips.csv`: closed positions
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &ForecastReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.run_id.chars().take(RUN_ID_PREFIX_LEN).collect();
    let run_dir = output_dir.join(format!("{}-{}", report.symbol, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_report_json(report)?)?;
    std::fs::write(
        run_dir.join("backtest.csv"),
        export_backtest_csv(&report.backtest)?,
    )?;
    std::fs::write(
        run_dir.join("signals.csv"),
        export_signals_csv(&report.outcome.signals)?,
    )?;
    std::fs::write(
        run_dir.join("round_trips.csv"),
        export_round_trips_csv(&report.outcome.round_trips)?,
    )?;

    tracing::debug!(dir = %run_dir.display(), "saved artifacts");
    Ok(run_dir)
}

/// Load a `ForecastReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<ForecastReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_report_json(&json)
}
