#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Write;
use tradesim::domain::engine::SimulationConfig;
use tradesim::domain::error::TradesimError;
pub use tradesim::domain::ohlcv::Bar;
use tradesim::domain::risk::RiskParameters;
use tradesim::domain::series::PriceSeries;
use tradesim::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<(String, String), PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, timeframe: &str, series: PriceSeries) -> Self {
        self.data
            .insert((series.symbol().to_string(), timeframe.to_string()), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<PriceSeries, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::data(reason.clone()));
        }
        self.data
            .get(&(symbol.to_string(), timeframe.to_string()))
            .cloned()
            .ok_or_else(|| TradesimError::data(format!("no data for {symbol} {timeframe}")))
    }

    fn list_series(&self) -> Result<Vec<(String, String)>, TradesimError> {
        let mut keys: Vec<_> = self.data.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError> {
        Ok(self
            .data
            .get(&(symbol.to_string(), timeframe.to_string()))
            .map(|s| {
                let (first, last) = s.range();
                (first, last, s.len())
            }))
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(index: usize, close: f64) -> Bar {
    Bar {
        timestamp: start_time() + chrono::Duration::minutes(5 * index as i64),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

pub fn make_series(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect();
    PriceSeries::new("BTC-USDT", bars).unwrap()
}

/// 1000 balance, 10% risk, 1% stop: a buy at 100 sizes to ~100 units.
pub fn scenario_config() -> SimulationConfig {
    SimulationConfig {
        initial_balance: 1000.0,
        leverage: 5.0,
        risk: RiskParameters {
            risk_fraction: 0.1,
            stop_loss_fraction: 0.01,
            reward_risk_ratio: 2.0,
        },
    }
}

/// Prices that rise then fall, so an SMA crossover produces trades.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + 10.0 * ((i as f64) / 6.0).sin())
        .collect()
}

pub fn series_csv(closes: &[f64]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for (i, &c) in closes.iter().enumerate() {
        let bar = make_bar(i, c);
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    out
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
