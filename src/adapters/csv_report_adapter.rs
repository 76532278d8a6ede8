//! Trade log CSV report adapter.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradesimError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;
use std::path::Path;

const HEADER: [&str; 6] = ["step", "timestamp", "side", "price", "size", "balance_after"];

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        _metrics: &Metrics,
        output_path: &Path,
    ) -> Result<(), TradesimError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(csv_error)?;
        writer.write_record(HEADER).map_err(csv_error)?;

        for trade in result.trades() {
            writer
                .write_record([
                    trade.step_index.to_string(),
                    trade.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    trade.side.to_string(),
                    trade.price.to_string(),
                    trade.size.to_string(),
                    trade.balance_after.to_string(),
                ])
                .map_err(csv_error)?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn csv_error(err: csv::Error) -> TradesimError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => TradesimError::Io(io),
        other => TradesimError::data(format!("CSV write error: {:?}", other)),
    }
}
