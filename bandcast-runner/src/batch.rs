//! Watchlist batch runs — independent forecasts over many symbols.
//!
//! Each symbol owns its dataset and its own signal engine, so runs share
//! nothing but the config and execute in parallel. A failing symbol is
//! reported in its entry and does not abort the batch.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::ForecastConfig;
use crate::dataset::{Dataset, DatasetError};
use crate::pipeline::{run_forecast, ForecastReport, RunError};

/// One symbol's input to a batch.
#[derive(Debug, Clone)]
pub struct WatchlistInput {
    pub symbol: String,
    pub dataset: Dataset,
}

/// One symbol's outcome.
#[derive(Debug)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub result: Result<ForecastReport, RunError>,
}

impl WatchlistEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every input. Output order matches input order.
pub fn run_watchlist(config: &ForecastConfig, inputs: &[WatchlistInput]) -> Vec<WatchlistEntry> {
    let entries: Vec<WatchlistEntry> = inputs
        .par_iter()
        .map(|input| {
            let result = run_forecast(&input.symbol, &input.dataset, config);
            if let Err(e) = &result {
                tracing::warn!(symbol = %input.symbol, error = %e, "forecast failed");
            }
            WatchlistEntry {
                symbol: input.symbol.clone(),
                result,
            }
        })
        .collect();

    let failed = entries.iter().filter(|e| !e.is_ok()).count();
    tracing::info!(symbols = entries.len(), failed, "watchlist complete");
    entries
}

/// Load every `<SYMBOL>.csv` in `dir`, sorted by symbol.
///
/// Files that fail to parse are returned in the error list rather than
/// aborting the scan.
pub fn load_watchlist_dir(
    dir: &Path,
) -> Result<(Vec<WatchlistInput>, Vec<(PathBuf, DatasetError)>), DatasetError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut inputs = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        let Some(symbol) = path.file_stem().and_then(|s| s.to_str()).map(str::to_uppercase)
        else {
            continue;
        };
        match Dataset::from_csv_path(&path) {
            Ok(dataset) => inputs.push(WatchlistInput { symbol, dataset }),
            Err(e) => failures.push((path, e)),
        }
    }
    Ok((inputs, failures))
}
