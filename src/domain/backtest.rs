//! Offline backtest: replays a precomputed signal column through the engine.

use crate::domain::engine::{ExecutionEngine, SimulationConfig};
use crate::domain::error::TradesimError;
use crate::domain::ledger::PositionState;
use crate::domain::recorder::{EquityPoint, ResultRecorder, TradeRecord};
use crate::domain::series::PriceSeries;
use crate::domain::signal::Signal;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_balance: f64,
    pub final_balance: f64,
    /// Final balance plus the value of a still-open position at the last close.
    pub final_equity: f64,
    pub open_position: PositionState,
    pub recorder: ResultRecorder,
}

impl BacktestResult {
    pub fn trades(&self) -> &[TradeRecord] {
        self.recorder.trades()
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        self.recorder.equity_curve()
    }
}

/// Run `signals` over `series`, starting at bar 1.
///
/// Bar 0 only seeds the run; its signal is ignored. The signal column must be
/// exactly as long as the series.
pub fn run_backtest(
    series: &PriceSeries,
    signals: &[Signal],
    config: SimulationConfig,
) -> Result<BacktestResult, TradesimError> {
    if signals.len() != series.len() {
        return Err(TradesimError::data(format!(
            "signal column has {} values for {} bars",
            signals.len(),
            series.len()
        )));
    }

    let mut engine = ExecutionEngine::new(series, config)?;

    while !engine.is_done() {
        let signal = signals[engine.current_step() + 1];
        engine.advance(signal.decision())?;
    }

    let final_balance = engine.ledger().balance();
    let final_equity = engine.equity();
    let open_position = engine.ledger().position();
    let recorder = engine.into_recorder();

    info!(
        symbol = series.symbol(),
        bars = series.len(),
        trades = recorder.trade_count(),
        final_balance,
        "backtest finished"
    );

    Ok(BacktestResult {
        initial_balance: config.initial_balance,
        final_balance,
        final_equity,
        open_position,
        recorder,
    })
}
