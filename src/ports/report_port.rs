//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradesimError;
use crate::domain::metrics::Metrics;
use std::path::Path;

/// Port for persisting backtest results.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_path: &Path,
    ) -> Result<(), TradesimError>;
}
