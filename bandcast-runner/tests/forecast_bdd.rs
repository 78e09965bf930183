//! BDD tests for the forecast pipeline, driven through files on disk.

use std::fs;
use std::path::Path;

use bandcast_core::calibration::FactorSource;
use bandcast_runner::{
    load_artifacts, run_forecast, save_artifacts, ConfigError, Dataset, DatasetError,
    EstimatorKind, ForecastConfig, ModelSelection, RunError,
};

fn write_dataset(dir: &Path, name: &str, dataset: &Dataset) -> std::path::PathBuf {
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    dataset.write_csv(file).unwrap();
    path
}

// ── Pipeline ──

#[test]
fn bdd_forecast_from_csv_and_toml() {
    // GIVEN a dataset CSV with an unlabeled tail and a TOML config
    let dir = tempfile::tempdir().unwrap();
    let data_path = write_dataset(dir.path(), "spy.csv", &Dataset::synthetic(17, 260, 21));
    let config_path = dir.path().join("forecast.toml");
    fs::write(
        &config_path,
        r#"
horizon_days = 21
confidence = 0.9
min_rows = 200

[models]
kind = "ensemble"
estimators = ["linear", "empirical"]
"#,
    )
    .unwrap();

    // WHEN the forecast runs
    let dataset = Dataset::from_csv_path(&data_path).unwrap();
    let config = ForecastConfig::from_file(&config_path).unwrap();
    let report = run_forecast("SPY", &dataset, &config).unwrap();

    // THEN the split is chronological at 80%
    assert_eq!(report.train_rows, 208);
    assert_eq!(report.test_rows(), 52);

    // AND the point forecast is anchored on the unlabeled newest row
    let (as_of, row) = dataset.latest().unwrap();
    assert_eq!(report.point.as_of, as_of);
    assert_eq!(report.point.anchor_price, row.close);
    assert!(report.point.price_low <= report.point.price_high);

    // AND the 21-day horizon uses its mapped factor
    assert_eq!(report.calibration.source, FactorSource::Mapped);
    assert_eq!(report.calibration.factor, 1.0);

    // AND both estimators took part
    assert_eq!(
        report.models,
        vec![EstimatorKind::Linear, EstimatorKind::Empirical]
    );
}

#[test]
fn bdd_wider_calibration_raises_coverage() {
    // GIVEN the same data forecast at the 5-day factor and at a doubled factor
    let dataset = Dataset::synthetic(23, 300, 5);
    let narrow = ForecastConfig {
        models: ModelSelection::Single {
            estimator: EstimatorKind::Empirical,
        },
        ..ForecastConfig::default()
    };
    let mut wide = narrow.clone();
    for f in &mut wide.calibration.factors {
        f.factor *= 2.0;
    }

    // WHEN both run
    let a = run_forecast("SYN", &dataset, &narrow).unwrap();
    let b = run_forecast("SYN", &dataset, &wide).unwrap();

    // THEN the wider bands are wider and cover at least as much
    assert!(b.metrics.avg_width > a.metrics.avg_width);
    assert!(b.metrics.coverage >= a.metrics.coverage);
}

#[test]
fn bdd_run_id_tracks_config() {
    // GIVEN two configs differing only in horizon
    let dataset = Dataset::synthetic(4, 220, 5);
    let base = ForecastConfig::default();
    let other = ForecastConfig {
        horizon_days: 21,
        ..base.clone()
    };

    // WHEN both run
    let a = run_forecast("SYN", &dataset, &base).unwrap();
    let b = run_forecast("SYN", &dataset, &other).unwrap();

    // THEN run ids follow the config hash
    assert_eq!(a.run_id, base.run_id());
    assert_ne!(a.run_id, b.run_id);
    assert_eq!(a.dataset_hash, b.dataset_hash);
}

// ── Failure modes ──

#[test]
fn bdd_too_few_rows_is_insufficient_data() {
    // GIVEN a dataset below the default 200-row minimum
    let dataset = Dataset::synthetic(1, 150, 5);

    // WHEN the forecast runs
    let err = run_forecast("SYN", &dataset, &ForecastConfig::default()).unwrap_err();

    // THEN it fails before training
    assert!(matches!(
        err,
        RunError::Dataset(DatasetError::InsufficientRows { rows: 150, min: 200 })
    ));
}

#[test]
fn bdd_invalid_config_file_is_rejected() {
    // GIVEN a config with confidence outside (0, 1)
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "confidence = 0.0\n").unwrap();

    // WHEN it is loaded
    let err = ForecastConfig::from_file(&path).unwrap_err();

    // THEN validation fails
    assert!(matches!(err, ConfigError::Core(_)));
}

#[test]
fn bdd_missing_data_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Dataset::from_csv_path(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, DatasetError::Io(_)));
}

// ── Artifacts ──

#[test]
fn bdd_artifacts_round_trip() {
    // GIVEN a completed forecast
    let dataset = Dataset::synthetic(8, 240, 5);
    let report = run_forecast("QQQ", &dataset, &ForecastConfig::default()).unwrap();

    // WHEN artifacts are saved
    let dir = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&report, dir.path()).unwrap();

    // THEN the directory is named after symbol and run id prefix
    let name = run_dir.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(name, format!("QQQ-{}", &report.run_id[..12]));
    for file in ["report.json", "backtest.csv", "signals.csv", "round_trips.csv"] {
        assert!(run_dir.join(file).exists(), "missing {file}");
    }

    // AND the backtest CSV has one line per test row plus a header
    let backtest = fs::read_to_string(run_dir.join("backtest.csv")).unwrap();
    assert_eq!(backtest.lines().count(), report.test_rows() + 1);

    // AND the report loads back
    let restored = load_artifacts(&run_dir).unwrap();
    assert_eq!(restored.run_id, report.run_id);
    assert_eq!(restored.point.as_of, report.point.as_of);
    assert_eq!(restored.backtest.len(), report.backtest.len());
    assert_eq!(restored.outcome.signals.len(), report.outcome.signals.len());
    assert!((restored.metrics.coverage - report.metrics.coverage).abs() < 1e-12);
}

#[test]
fn bdd_newer_schema_is_rejected() {
    // GIVEN a saved report whose schema version is from the future
    let dataset = Dataset::synthetic(8, 240, 5);
    let mut report = run_forecast("QQQ", &dataset, &ForecastConfig::default()).unwrap();
    report.schema_version = 99;
    let json = bandcast_runner::export_report_json(&report).unwrap();

    // WHEN it is imported
    let err = bandcast_runner::import_report_json(&json).unwrap_err();

    // THEN the version is named in the error
    assert!(err.to_string().contains("unsupported schema version 99"));
}
