//! Price data access port trait.

use crate::domain::error::TradesimError;
use crate::domain::series::PriceSeries;
use chrono::NaiveDateTime;

pub trait DataPort {
    fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<PriceSeries, TradesimError>;

    /// `(symbol, timeframe)` pairs available from this source.
    fn list_series(&self) -> Result<Vec<(String, String)>, TradesimError>;

    fn get_data_range(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError>;
}
