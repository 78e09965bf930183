//! Feature/target dataset loading.
//!
//! A dataset is a date-ordered table of feature rows with a forward return
//! target. Rows whose target is blank are unlabeled: they can only appear at
//! the tail (the last `horizon` days whose future is not yet known). The
//! newest row, labeled or not, anchors the live point forecast.
//!
//! Expected CSV header (column order is free, names are case-insensitive):
//!
//! ```text
//! date,Close,VIX,ATR,BB_Width,Return,Target_Return
//! ```

use std::io::Read;
use std::ops::Range;
use std::path::Path;

use bandcast_core::domain::{FeatureRow, FeatureTable, FEATURE_COLUMNS};
use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Column holding the trading date (`YYYY-MM-DD`).
pub const DATE_COLUMN: &str = "date";
/// Column holding the forward return target.
pub const TARGET_COLUMN: &str = "Target_Return";

/// Errors from the data layer.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("line {line}: cannot parse {column} value '{value}'")]
    Parse {
        line: usize,
        column: String,
        value: String,
    },
    #[error("line {line}: non-finite {column}")]
    NonFinite { line: usize, column: String },
    #[error("line {line}: dates must be strictly increasing")]
    NotChronological { line: usize },
    #[error("line {line}: labeled row follows an unlabeled row")]
    LabelAfterGap { line: usize },
    #[error("column lengths differ: {dates} dates, {features} feature rows, {targets} targets")]
    Misaligned {
        dates: usize,
        features: usize,
        targets: usize,
    },
    #[error("insufficient data: {rows} labeled rows, need at least {min}")]
    InsufficientRows { rows: usize, min: usize },
    #[error("split ratio {ratio} leaves an empty train or test set for {rows} rows")]
    EmptySplit { ratio: f64, rows: usize },
}

/// Date-ordered features and targets for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    features: FeatureTable,
    /// One entry per labeled row; unlabeled tail rows have none.
    target: Vec<f64>,
}

/// Chronological train/test partition of the labeled rows.
#[derive(Debug, Clone)]
pub struct Split {
    pub train_features: FeatureTable,
    pub train_target: Vec<f64>,
    pub test_dates: Vec<NaiveDate>,
    pub test_features: FeatureTable,
    pub test_target: Vec<f64>,
}

impl Dataset {
    /// Build from aligned columns. `target` may be shorter than the feature
    /// table; the missing tail rows are unlabeled.
    pub fn from_parts(
        dates: Vec<NaiveDate>,
        features: FeatureTable,
        target: Vec<f64>,
    ) -> Result<Self, DatasetError> {
        if dates.len() != features.len() || target.len() > features.len() {
            return Err(DatasetError::Misaligned {
                dates: dates.len(),
                features: features.len(),
                targets: target.len(),
            });
        }
        if let Some(i) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DatasetError::NotChronological { line: i + 2 });
        }
        Ok(Self {
            dates,
            features,
            target,
        })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Parse a dataset from CSV. Line numbers in errors are 1-based and
    /// count the header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };
        let date_idx = find(DATE_COLUMN)?;
        let target_idx = find(TARGET_COLUMN)?;
        let feature_idx = FEATURE_COLUMNS
            .iter()
            .map(|&c| find(c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut dates = Vec::new();
        let mut rows = Vec::new();
        let mut target = Vec::new();
        let mut unlabeled_seen = false;

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let line = i + 2;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let raw_date = field(date_idx);
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
                DatasetError::Parse {
                    line,
                    column: DATE_COLUMN.to_string(),
                    value: raw_date.to_string(),
                }
            })?;

            let mut values = [0.0; 5];
            for (slot, (&idx, name)) in values
                .iter_mut()
                .zip(feature_idx.iter().zip(FEATURE_COLUMNS))
            {
                *slot = parse_number(field(idx), line, name)?;
            }
            let [close, vix, atr, bb_width, ret] = values;
            rows.push(FeatureRow::new(close, vix, atr, bb_width, ret));
            dates.push(date);

            let raw_target = field(target_idx);
            if raw_target.is_empty() {
                unlabeled_seen = true;
            } else if unlabeled_seen {
                return Err(DatasetError::LabelAfterGap { line });
            } else {
                target.push(parse_number(raw_target, line, TARGET_COLUMN)?);
            }
        }

        let dataset = Self::from_parts(dates, FeatureTable::new(rows), target)?;
        tracing::debug!(
            rows = dataset.len(),
            labeled = dataset.labeled_len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Deterministic random-walk dataset for demos and tests.
    ///
    /// `n` labeled rows are followed by `horizon` unlabeled rows. Targets are
    /// the true forward `horizon`-row returns of the generated close series.
    pub fn synthetic(seed: u64, n: usize, horizon: usize) -> Self {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(seed);
        let total = n + horizon;
        let mut dates = Vec::with_capacity(total);
        let mut closes = Vec::with_capacity(total);
        let mut rows = Vec::with_capacity(total);

        let mut current = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap_or_default();
        let mut price = 100.0_f64;
        let mut vix = 18.0_f64;

        while dates.len() < total {
            let weekday = current.weekday();
            if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
                current += chrono::Duration::days(1);
                continue;
            }

            // Volatility regime drifts with the fear index.
            vix = (vix + rng.gen_range(-1.5..1.5)).clamp(10.0, 45.0);
            let vol = vix / 100.0 / 16.0;
            let daily_return: f64 = rng.gen_range(-2.0..2.0) * vol;
            let close = price * (1.0 + daily_return);
            let atr = close * vol * rng.gen_range(0.8..1.2);
            let bb_width = 4.0 * vol * rng.gen_range(3.5..5.0);

            rows.push(FeatureRow::new(close, vix, atr, bb_width, daily_return));
            closes.push(close);
            dates.push(current);

            price = close;
            current += chrono::Duration::days(1);
        }

        let target = (0..n)
            .map(|i| closes[i + horizon] / closes[i] - 1.0)
            .collect();

        Self {
            dates,
            features: FeatureTable::new(rows),
            target,
        }
    }

    /// Total rows, labeled and unlabeled.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn labeled_len(&self) -> usize {
        self.target.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Newest row and its date; anchors the live forecast.
    pub fn latest(&self) -> Option<(NaiveDate, FeatureRow)> {
        let date = *self.dates.last()?;
        let row = *self.features.last()?;
        Some((date, row))
    }

    /// Fail unless at least `min` labeled rows are present.
    pub fn ensure_rows(&self, min: usize) -> Result<(), DatasetError> {
        if self.labeled_len() < min {
            return Err(DatasetError::InsufficientRows {
                rows: self.labeled_len(),
                min,
            });
        }
        Ok(())
    }

    /// Reject NaN or infinite values. Unlabeled tail rows count too: the
    /// newest one is the live row fed to the point forecast.
    pub fn ensure_finite(&self) -> Result<(), DatasetError> {
        for (i, row) in self.features.rows().iter().enumerate() {
            if row.has_non_finite() {
                return Err(DatasetError::NonFinite {
                    line: i + 2,
                    column: "features".into(),
                });
            }
        }
        if let Some(i) = self.target.iter().position(|t| !t.is_finite()) {
            return Err(DatasetError::NonFinite {
                line: i + 2,
                column: TARGET_COLUMN.into(),
            });
        }
        Ok(())
    }

    /// Chronological split at `floor(labeled_len * ratio)`. No shuffling.
    pub fn split(&self, ratio: f64) -> Result<Split, DatasetError> {
        let n = self.labeled_len();
        let idx = (n as f64 * ratio).floor() as usize;
        if idx == 0 || idx >= n {
            return Err(DatasetError::EmptySplit { ratio, rows: n });
        }
        let train = 0..idx;
        let test: Range<usize> = idx..n;
        Ok(Split {
            train_features: self.features.slice(train.clone()),
            train_target: self.target[train].to_vec(),
            test_dates: self.dates[test.clone()].to_vec(),
            test_features: self.features.slice(test.clone()),
            test_target: self.target[test].to_vec(),
        })
    }

    /// Write in the layout [`Dataset::from_csv_reader`] accepts. Unlabeled
    /// rows get an empty target cell.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), DatasetError> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec![DATE_COLUMN];
        header.extend(FEATURE_COLUMNS);
        header.push(TARGET_COLUMN);
        wtr.write_record(&header)?;
        for (i, (date, row)) in self.dates.iter().zip(self.features.rows()).enumerate() {
            let mut record = vec![date.to_string()];
            record.extend(row.to_array().iter().map(|v| v.to_string()));
            record.push(self.target.get(i).map(|t| t.to_string()).unwrap_or_default());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// BLAKE3 fingerprint over dates, features, and targets.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (date, row) in self.dates.iter().zip(self.features.rows()) {
            hasher.update(date.to_string().as_bytes());
            for v in row.to_array() {
                hasher.update(&v.to_le_bytes());
            }
        }
        for t in &self.target {
            hasher.update(&t.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn parse_number(raw: &str, line: usize, column: &str) -> Result<f64, DatasetError> {
    raw.parse::<f64>().map_err(|_| DatasetError::Parse {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,Close,VIX,ATR,BB_Width,Return,Target_Return
2024-01-02,100.0,15.0,1.2,0.05,0.001,0.010
2024-01-03,101.0,15.5,1.3,0.06,0.010,-0.020
2024-01-04,99.0,16.0,1.1,0.05,-0.020,
2024-01-05,99.5,16.2,1.1,0.05,0.005,
";

    #[test]
    fn parses_labeled_and_unlabeled_rows() {
        let ds = Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.labeled_len(), 2);
        assert_eq!(ds.target(), &[0.010, -0.020]);
        let (date, row) = ds.latest().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(row.close, 99.5);
    }

    #[test]
    fn columns_may_be_reordered() {
        let csv = "\
Target_Return,return,bb_width,atr,vix,close,Date
0.01,0.001,0.05,1.2,15.0,100.0,2024-01-02
";
        let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.features().rows()[0].close, 100.0);
        assert_eq!(ds.features().rows()[0].ret, 0.001);
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "date,Close,VIX,ATR,Return,Target_Return\n";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(c) if c == "BB_Width"));
    }

    #[test]
    fn non_numeric_value_is_reported_with_line() {
        let csv = "\
date,Close,VIX,ATR,BB_Width,Return,Target_Return
2024-01-02,abc,15.0,1.2,0.05,0.001,0.010
";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 2, .. }));
    }

    #[test]
    fn non_finite_feature_in_unlabeled_tail_is_rejected() {
        // GIVEN a VIX of NaN on the live row, which has no target
        let csv = SAMPLE.replace("2024-01-05,99.5,16.2", "2024-01-05,99.5,NaN");
        let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        // WHEN checked before training
        let err = ds.ensure_finite().unwrap_err();
        // THEN the offending line is named
        assert!(matches!(err, DatasetError::NonFinite { line: 5, .. }));
    }

    #[test]
    fn label_after_gap_is_rejected() {
        let csv = "\
date,Close,VIX,ATR,BB_Width,Return,Target_Return
2024-01-02,100,15,1,0.05,0.0,
2024-01-03,101,15,1,0.05,0.0,0.01
";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::LabelAfterGap { line: 3 }));
    }

    #[test]
    fn dates_must_increase() {
        let csv = "\
date,Close,VIX,ATR,BB_Width,Return,Target_Return
2024-01-03,100,15,1,0.05,0.0,0.01
2024-01-02,101,15,1,0.05,0.0,0.01
";
        let err = Dataset::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::NotChronological { line: 2 }));
    }

    #[test]
    fn split_is_chronological() {
        let ds = Dataset::synthetic(7, 100, 5);
        let split = ds.split(0.8).unwrap();
        assert_eq!(split.train_features.len(), 80);
        assert_eq!(split.test_features.len(), 20);
        assert_eq!(split.test_dates[0], ds.dates()[80]);
        assert_eq!(split.test_target[0], ds.target()[80]);
    }

    #[test]
    fn degenerate_split_is_rejected() {
        let ds = Dataset::synthetic(7, 3, 1);
        assert!(matches!(
            ds.split(0.1),
            Err(DatasetError::EmptySplit { rows: 3, .. })
        ));
    }

    #[test]
    fn insufficient_rows() {
        let ds = Dataset::synthetic(1, 50, 5);
        assert!(ds.ensure_rows(50).is_ok());
        assert!(matches!(
            ds.ensure_rows(200),
            Err(DatasetError::InsufficientRows { rows: 50, min: 200 })
        ));
    }

    #[test]
    fn synthetic_is_deterministic_and_consistent() {
        let a = Dataset::synthetic(42, 60, 5);
        let b = Dataset::synthetic(42, 60, 5);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.len(), 65);
        assert_eq!(a.labeled_len(), 60);
        assert!(a.ensure_finite().is_ok());

        let closes = a.features().closes();
        let expected = closes[5] / closes[0] - 1.0;
        assert!((a.target()[0] - expected).abs() < 1e-12);

        let c = Dataset::synthetic(43, 60, 5);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn csv_write_then_read_preserves_dataset() {
        let ds = Dataset::synthetic(21, 30, 3);
        let mut buf = Vec::new();
        ds.write_csv(&mut buf).unwrap();
        let restored = Dataset::from_csv_reader(buf.as_slice()).unwrap();
        assert_eq!(restored, ds);
    }

    #[test]
    fn synthetic_skips_weekends() {
        let ds = Dataset::synthetic(3, 30, 0);
        assert!(ds
            .dates()
            .iter()
            .all(|d| !matches!(d.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)));
    }
}
