//! CSV file data adapter.
//!
//! Files live at `{base_path}/{symbol}_{timeframe}.csv` and are read by header
//! name. Required columns: timestamp, open, high, low, close, volume
//! (`volume_base` is accepted for volume). Every other column that parses as a
//! number becomes an extra feature column.

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::Bar;
use crate::domain::series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const REQUIRED: [&str; 5] = ["timestamp", "open", "high", "low", "close"];
const VOLUME_COLUMNS: [&str; 2] = ["volume", "volume_base"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<PriceSeries, TradesimError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| {
            TradesimError::data(format!("failed to read {}: {}", path.display(), e))
        })?;
        let series = parse_series(symbol, &content)?;
        debug!(
            path = %path.display(),
            bars = series.len(),
            features = series.feature_width(),
            "loaded price series"
        );
        Ok(series)
    }

    fn list_series(&self) -> Result<Vec<(String, String)>, TradesimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            TradesimError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| TradesimError::data(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".csv") {
                if let Some((symbol, timeframe)) = stem.rsplit_once('_') {
                    found.push((symbol.to_string(), timeframe.to_string()));
                }
            }
        }

        found.sort();
        Ok(found)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError> {
        if !self.csv_path(symbol, timeframe).exists() {
            return Ok(None);
        }
        let series = self.fetch_series(symbol, timeframe)?;
        let (first, last) = series.range();
        Ok(Some((first, last, series.len())))
    }
}

/// Parse CSV text into a price series. Rows are sorted by timestamp.
pub fn parse_series(symbol: &str, content: &str) -> Result<PriceSeries, TradesimError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| TradesimError::data(format!("CSV header error: {}", e)))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);

    let mut missing: Vec<&str> = REQUIRED
        .iter()
        .copied()
        .filter(|name| column(name).is_none())
        .collect();
    let volume_idx = VOLUME_COLUMNS.iter().find_map(|name| column(name));
    if volume_idx.is_none() {
        missing.push("volume");
    }
    if !missing.is_empty() {
        return Err(TradesimError::data(format!(
            "missing required columns [{}]; available: [{}]",
            missing.join(", "),
            headers.join(", ")
        )));
    }

    let [ts_idx, open_idx, high_idx, low_idx, close_idx] = REQUIRED.map(|name| column(name));
    let (ts_idx, open_idx, high_idx, low_idx, close_idx, volume_idx) = match (
        ts_idx, open_idx, high_idx, low_idx, close_idx, volume_idx,
    ) {
        (Some(t), Some(o), Some(h), Some(l), Some(c), Some(v)) => (t, o, h, l, c, v),
        _ => return Err(TradesimError::data("missing required columns")),
    };
    let used = [ts_idx, open_idx, high_idx, low_idx, close_idx, volume_idx];

    let records: Vec<csv::StringRecord> = rdr
        .records()
        .collect::<Result<_, _>>()
        .map_err(|e| TradesimError::data(format!("CSV parse error: {}", e)))?;

    let extra_idx: Vec<usize> = (0..headers.len())
        .filter(|i| !used.contains(i))
        .filter(|&i| {
            let numeric = records
                .iter()
                .all(|r| parse_feature(r.get(i).unwrap_or("")).is_some());
            if !numeric {
                warn!(column = %headers[i], "skipping non-numeric column");
            }
            numeric
        })
        .collect();

    let mut rows: Vec<(Bar, Vec<f64>)> = Vec::with_capacity(records.len());
    for (line, record) in records.iter().enumerate() {
        let field = |idx: usize, name: &str| -> Result<f64, TradesimError> {
            let raw = record.get(idx).unwrap_or("").trim();
            raw.parse::<f64>().map_err(|_| {
                TradesimError::data(format!("row {}: invalid {} value '{}'", line + 1, name, raw))
            })
        };

        let raw_ts = record.get(ts_idx).unwrap_or("").trim();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
            TradesimError::data(format!("row {}: invalid timestamp '{}'", line + 1, raw_ts))
        })?;

        let bar = Bar {
            timestamp,
            open: field(open_idx, "open")?,
            high: field(high_idx, "high")?,
            low: field(low_idx, "low")?,
            close: field(close_idx, "close")?,
            volume: field(volume_idx, "volume")?,
        };
        let extras = extra_idx
            .iter()
            .map(|&i| parse_feature(record.get(i).unwrap_or("")).unwrap_or(f64::NAN))
            .collect();
        rows.push((bar, extras));
    }

    rows.sort_by_key(|(bar, _)| bar.timestamp);
    let (bars, extra_values): (Vec<Bar>, Vec<Vec<f64>>) = rows.into_iter().unzip();
    let extra_columns = extra_idx.iter().map(|&i| headers[i].clone()).collect();

    PriceSeries::with_features(symbol, bars, extra_columns, extra_values)
}

/// Epoch milliseconds, RFC 3339, `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S` or `%Y-%m-%d`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Empty cells and `nan` read as NaN (indicator warmup rows).
fn parse_feature(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}
