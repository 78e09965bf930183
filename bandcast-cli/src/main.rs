//! Bandcast CLI — interval forecasts and mean-reversion backtests.
//!
//! Commands:
//! - `forecast`: forecast one symbol from a dataset CSV (or synthetic data)
//! - `batch`: forecast every `<SYMBOL>.csv` in a directory in parallel
//! - `recent`: list recently forecast symbols

mod recent;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use bandcast_core::calibration::FactorSource;
use bandcast_runner::{
    load_watchlist_dir, run_forecast, run_watchlist, save_artifacts, Dataset, EstimatorKind,
    ForecastConfig, ForecastReport, ModelSelection,
};

const RECENT_FILE: &str = "recent.json";

#[derive(Parser)]
#[command(
    name = "bandcast",
    about = "Bandcast — quantile interval forecasts and mean-reversion backtests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast one symbol and backtest the mean-reversion strategy.
    Forecast {
        /// Dataset CSV (date,Close,VIX,ATR,BB_Width,Return,Target_Return).
        #[arg(long)]
        data: Option<PathBuf>,

        /// Symbol label for reports.
        #[arg(long)]
        symbol: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Forecast horizon in trading days (overrides config).
        #[arg(long)]
        horizon: Option<u32>,

        /// Interval confidence in (0, 1) (overrides config).
        #[arg(long)]
        confidence: Option<f64>,

        /// Model: linear, empirical, or ensemble (overrides config).
        #[arg(long)]
        model: Option<String>,

        /// Generate a synthetic dataset instead of reading --data.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Labeled rows for --synthetic.
        #[arg(long, default_value_t = 500)]
        rows: usize,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Directory holding the recent-symbols list.
        #[arg(long, default_value = ".bandcast")]
        state_dir: PathBuf,
    },
    /// Forecast every CSV in a directory.
    Batch {
        /// Directory of `<SYMBOL>.csv` files.
        #[arg(long)]
        data_dir: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// List recently forecast symbols, most recent first.
    Recent {
        #[arg(long, default_value = ".bandcast")]
        state_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            data,
            symbol,
            config,
            horizon,
            confidence,
            model,
            synthetic,
            seed,
            rows,
            output_dir,
            state_dir,
        } => {
            let overrides = Overrides {
                horizon,
                confidence,
                model,
            };
            let source = match (data, synthetic) {
                (Some(_), true) => bail!("--data and --synthetic are mutually exclusive"),
                (Some(path), false) => DataSource::Csv(path),
                (None, true) => DataSource::Synthetic { seed, rows },
                (None, false) => bail!("one of --data or --synthetic is required"),
            };
            run_forecast_cmd(
                &symbol,
                source,
                config.as_deref(),
                &overrides,
                &output_dir,
                &state_dir,
            )
        }
        Commands::Batch {
            data_dir,
            config,
            output_dir,
        } => run_batch_cmd(&data_dir, config.as_deref(), &output_dir),
        Commands::Recent { state_dir } => {
            let list = recent::load(&state_dir.join(RECENT_FILE));
            if list.is_empty() {
                println!("No recent symbols.");
            }
            for symbol in list.symbols() {
                println!("{symbol}");
            }
            Ok(())
        }
    }
}

enum DataSource {
    Csv(PathBuf),
    Synthetic { seed: u64, rows: usize },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
struct Overrides {
    horizon: Option<u32>,
    confidence: Option<f64>,
    model: Option<String>,
}

fn build_config(path: Option<&Path>, overrides: &Overrides) -> Result<ForecastConfig> {
    let mut config = match path {
        Some(p) => ForecastConfig::from_file(p)?,
        None => ForecastConfig::default(),
    };
    if let Some(h) = overrides.horizon {
        config.horizon_days = h;
    }
    if let Some(c) = overrides.confidence {
        config.confidence = c;
    }
    if let Some(name) = overrides.model.as_deref() {
        config.models = parse_model(name)?;
    }
    config.validate()?;
    Ok(config)
}

fn parse_model(name: &str) -> Result<ModelSelection> {
    if name.eq_ignore_ascii_case("ensemble") {
        return Ok(ModelSelection::default());
    }
    match EstimatorKind::parse(name) {
        Some(estimator) => Ok(ModelSelection::Single { estimator }),
        None => bail!("unknown model '{name}'. Valid: linear, empirical, ensemble"),
    }
}

fn run_forecast_cmd(
    symbol: &str,
    source: DataSource,
    config_path: Option<&Path>,
    overrides: &Overrides,
    output_dir: &Path,
    state_dir: &Path,
) -> Result<()> {
    // Same key batch runs derive from file stems.
    let symbol = symbol.to_uppercase();
    let config = build_config(config_path, overrides)?;
    let dataset = match source {
        DataSource::Csv(path) => Dataset::from_csv_path(&path)?,
        DataSource::Synthetic { seed, rows } => {
            Dataset::synthetic(seed, rows, config.horizon_days as usize)
        }
    };

    let report = run_forecast(&symbol, &dataset, &config)?;
    print_summary(&report);

    let run_dir = save_artifacts(&report, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    let recent_path = state_dir.join(RECENT_FILE);
    let mut list = recent::load(&recent_path);
    list.touch(&symbol);
    if let Err(e) = recent::save(&recent_path, &list) {
        tracing::warn!(error = %e, "could not save recent symbols");
    }

    Ok(())
}

fn run_batch_cmd(data_dir: &Path, config_path: Option<&Path>, output_dir: &Path) -> Result<()> {
    let config = build_config(config_path, &Overrides::default())?;
    let (inputs, failures) = load_watchlist_dir(data_dir)?;
    for (path, err) in &failures {
        eprintln!("Skipping {}: {err}", path.display());
    }
    if inputs.is_empty() {
        bail!("no readable datasets in {}", data_dir.display());
    }

    let entries = run_watchlist(&config, &inputs);

    println!();
    println!(
        "{:<8} {:>12} {:>12} {:>9} {:>9} {:>10} {:>7}",
        "Symbol", "Low", "High", "Coverage", "Width", "PnL", "Trades"
    );
    let mut failed = 0usize;
    for entry in &entries {
        match &entry.result {
            Ok(report) => {
                println!(
                    "{:<8} {:>12.2} {:>12.2} {:>8.1}% {:>9.2} {:>10.2} {:>7}",
                    entry.symbol,
                    report.point.price_low,
                    report.point.price_high,
                    report.metrics.coverage * 100.0,
                    report.metrics.avg_width,
                    report.metrics.pnl,
                    report.metrics.trade_count
                );
                save_artifacts(report, output_dir)?;
            }
            Err(e) => {
                failed += 1;
                println!("{:<8} ERROR: {e}", entry.symbol);
            }
        }
    }
    println!();
    println!(
        "{} of {} symbols succeeded. Artifacts in {}",
        entries.len() - failed,
        entries.len(),
        output_dir.display()
    );
    Ok(())
}

fn print_summary(report: &ForecastReport) {
    let p = &report.point;
    let m = &report.metrics;
    println!();
    println!("=== Forecast ===");
    println!("Symbol:         {}", report.symbol);
    println!(
        "Models:         {}",
        report
            .models
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(" + ")
    );
    println!(
        "Horizon:        {} days ({:.0}% interval)",
        report.horizon_days,
        report.confidence * 100.0
    );
    println!("As of:          {} (close {:.2})", p.as_of, p.anchor_price);
    println!(
        "Target {}:  {:.2} to {:.2}",
        p.target_date, p.price_low, p.price_high
    );
    println!(
        "Return band:    {:+.2}% to {:+.2}%",
        p.return_low * 100.0,
        p.return_high * 100.0
    );
    let signal = report
        .current_signal()
        .map(|k| k.as_str())
        .unwrap_or("HOLD");
    println!("Signal:         {signal}");
    println!();
    println!("--- Backtest ({} train / {} test rows) ---", report.train_rows, report.test_rows());
    println!("Coverage:       {:.1}%", m.coverage * 100.0);
    println!("Avg Width:      {:.2}", m.avg_width);
    println!("PnL:            {:.2}", m.pnl);
    println!("Trades:         {}", m.trade_count);
    println!("Win Rate:       {:.1}%", report.outcome.win_rate() * 100.0);
    if let Some(open) = &report.outcome.open_position {
        println!(
            "Open:           {:?} since {} @ {:.2}",
            open.side, open.entry_date, open.entry_price
        );
    }
    if report.calibration.source == FactorSource::Fallback {
        println!();
        println!(
            "WARNING: horizon {} has no calibration entry; used fallback factor {}",
            report.horizon_days, report.calibration.factor
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_parse() {
        assert_eq!(
            parse_model("linear").unwrap(),
            ModelSelection::Single {
                estimator: EstimatorKind::Linear
            }
        );
        assert_eq!(parse_model("Ensemble").unwrap(), ModelSelection::default());
        assert!(parse_model("lstm").is_err());
    }

    #[test]
    fn overrides_take_precedence_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "horizon_days = 60\nconfidence = 0.8\n").unwrap();

        let overrides = Overrides {
            horizon: Some(21),
            confidence: None,
            model: Some("empirical".into()),
        };
        let config = build_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.horizon_days, 21);
        assert_eq!(config.confidence, 0.8);
        assert_eq!(config.models.estimators(), vec![EstimatorKind::Empirical]);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let overrides = Overrides {
            confidence: Some(1.5),
            ..Overrides::default()
        };
        assert!(build_config(None, &overrides).is_err());
    }

    #[test]
    fn synthetic_forecast_saves_artifacts_and_recent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let state = dir.path().join("state");
        run_forecast_cmd(
            "SYN",
            DataSource::Synthetic { seed: 5, rows: 260 },
            None,
            &Overrides::default(),
            &out,
            &state,
        )
        .unwrap();

        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
        let list = recent::load(&state.join(RECENT_FILE));
        assert_eq!(list.symbols(), &["SYN".to_string()]);
    }

    #[test]
    fn lowercase_symbol_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let state = dir.path().join("state");
        run_forecast_cmd(
            "syn",
            DataSource::Synthetic { seed: 5, rows: 260 },
            None,
            &Overrides::default(),
            &out,
            &state,
        )
        .unwrap();

        let run_dir = std::fs::read_dir(&out).unwrap().next().unwrap().unwrap();
        assert!(run_dir.file_name().to_string_lossy().starts_with("SYN-"));
        let list = recent::load(&state.join(RECENT_FILE));
        assert_eq!(list.symbols(), &["SYN".to_string()]);
    }
}
