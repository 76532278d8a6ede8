//! Immutable, time-ordered price series with optional extra feature columns.

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::{BAR_COLUMNS, BAR_FEATURE_COUNT, Bar};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
    extra_columns: Vec<String>,
    extra_values: Vec<Vec<f64>>,
}

impl PriceSeries {
    /// Build a series from bars only.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, TradesimError> {
        let rows = vec![Vec::new(); bars.len()];
        Self::with_features(symbol, bars, Vec::new(), rows)
    }

    /// Build a series whose feature rows carry `extra_columns` after the bar values.
    ///
    /// Bars must be strictly increasing in time and every row must have exactly
    /// one value per extra column.
    pub fn with_features(
        symbol: impl Into<String>,
        bars: Vec<Bar>,
        extra_columns: Vec<String>,
        extra_values: Vec<Vec<f64>>,
    ) -> Result<Self, TradesimError> {
        if bars.is_empty() {
            return Err(TradesimError::data("price series is empty"));
        }
        if extra_values.len() != bars.len() {
            return Err(TradesimError::data(format!(
                "{} feature rows for {} bars",
                extra_values.len(),
                bars.len()
            )));
        }

        for (i, row) in extra_values.iter().enumerate() {
            if row.len() != extra_columns.len() {
                return Err(TradesimError::data(format!(
                    "row {} has {} extra values, expected {}",
                    i,
                    row.len(),
                    extra_columns.len()
                )));
            }
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.values().iter().all(|v| v.is_finite()) {
                return Err(TradesimError::data(format!(
                    "non-finite price or volume at {}",
                    bar.timestamp
                )));
            }
            if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
                return Err(TradesimError::data(format!(
                    "timestamps not strictly increasing at {}",
                    bar.timestamp
                )));
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
            extra_columns,
            extra_values,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
    }

    /// First and last timestamps.
    pub fn range(&self) -> (NaiveDateTime, NaiveDateTime) {
        // with_features rejects empty input, so both ends exist
        let first = self.bars[0].timestamp;
        let last = self.bars[self.bars.len() - 1].timestamp;
        (first, last)
    }

    /// Every column except the timestamp, in feature-row order.
    pub fn feature_names(&self) -> Vec<String> {
        BAR_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }

    /// Values of one extra column across all bars.
    pub fn extra_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.extra_columns.iter().position(|c| c == name)?;
        Some(self.extra_values.iter().map(|row| row[idx]).collect())
    }

    pub fn feature_width(&self) -> usize {
        BAR_FEATURE_COUNT + self.extra_columns.len()
    }

    /// Feature row for bar `index`: open, high, low, close, volume, then extras.
    pub fn feature_row(&self, index: usize) -> Option<Vec<f64>> {
        let bar = self.bars.get(index)?;
        let extras = self.extra_values.get(index)?;
        let mut row = Vec::with_capacity(self.feature_width());
        row.extend_from_slice(&bar.values());
        row.extend_from_slice(extras);
        Some(row)
    }
}
