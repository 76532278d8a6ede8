//! OHLCV bar representation.

use chrono::NaiveDateTime;

/// Number of values a bar contributes to a feature row.
pub const BAR_FEATURE_COUNT: usize = 5;

/// Names of the bar columns, in feature-row order.
pub const BAR_COLUMNS: [&str; BAR_FEATURE_COUNT] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// [open, high, low, close, volume]
    pub fn values(&self) -> [f64; BAR_FEATURE_COUNT] {
        [self.open, self.high, self.low, self.close, self.volume]
    }
}
