//! Execution state machine shared by the backtest and environment runners.
//!
//! | state | decision | effect                              | next |
//! |-------|----------|-------------------------------------|------|
//! | Flat  | Hold     | none                                | Flat |
//! | Flat  | Buy      | size via risk sizer, open at close  | Long |
//! | Flat  | Sell     | none                                | Flat |
//! | Long  | Hold     | none                                | Long |
//! | Long  | Buy      | none (no averaging in)              | Long |
//! | Long  | Sell     | close at close, reward = realized   | Flat |
//!
//! Reward is 0 on every step that does not close a position. An open
//! position is never force-closed at the end of the series.

use crate::domain::error::TradesimError;
use crate::domain::ledger::PositionLedger;
use crate::domain::recorder::{ResultRecorder, TradeRecord, TradeSide};
use crate::domain::risk::{self, RiskParameters};
use crate::domain::series::PriceSeries;
use std::fmt;
use tracing::debug;

/// Construction-time run parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub initial_balance: f64,
    /// Carried through configuration; sizing and P&L do not apply it.
    pub leverage: f64,
    pub risk: RiskParameters,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_balance: 1000.0,
            leverage: 5.0,
            risk: RiskParameters::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Hold,
    Buy,
    Sell,
}

impl Decision {
    pub fn action(self) -> u8 {
        match self {
            Decision::Hold => 0,
            Decision::Buy => 1,
            Decision::Sell => 2,
        }
    }
}

impl TryFrom<u8> for Decision {
    type Error = TradesimError;

    fn try_from(action: u8) -> Result<Self, Self::Error> {
        match action {
            0 => Ok(Decision::Hold),
            1 => Ok(Decision::Buy),
            2 => Ok(Decision::Sell),
            other => Err(TradesimError::invalid_call(format!(
                "action {other} is outside {{0, 1, 2}}"
            ))),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Hold => write!(f, "hold"),
            Decision::Buy => write!(f, "buy"),
            Decision::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    None,
    Opened { price: f64, size: f64 },
    Closed { price: f64, size: f64, pnl: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub step_index: usize,
    pub decision: Decision,
    pub transition: Transition,
    pub reward: f64,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct ExecutionEngine<'a> {
    series: &'a PriceSeries,
    config: SimulationConfig,
    ledger: PositionLedger,
    recorder: ResultRecorder,
    current_step: usize,
    last_executed: Option<usize>,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(series: &'a PriceSeries, config: SimulationConfig) -> Result<Self, TradesimError> {
        if !(config.initial_balance.is_finite() && config.initial_balance > 0.0) {
            return Err(TradesimError::ConfigInvalid {
                section: "simulation".into(),
                key: "initial_balance".into(),
                reason: "initial_balance must be positive".into(),
            });
        }
        if series.is_empty() {
            return Err(TradesimError::data("price series is empty"));
        }

        Ok(ExecutionEngine {
            series,
            config,
            ledger: PositionLedger::new(config.initial_balance),
            recorder: ResultRecorder::new(),
            current_step: 0,
            last_executed: None,
        })
    }

    /// Back to `{initial_balance, Flat}` at step 0 with an empty recorder.
    pub fn reset(&mut self) {
        self.ledger = PositionLedger::new(self.config.initial_balance);
        self.recorder = ResultRecorder::new();
        self.current_step = 0;
        self.last_executed = None;
    }

    pub fn series(&self) -> &'a PriceSeries {
        self.series
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn recorder(&self) -> &ResultRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> ResultRecorder {
        self.recorder
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn last_index(&self) -> usize {
        self.series.len() - 1
    }

    pub fn is_done(&self) -> bool {
        self.current_step >= self.last_index()
    }

    /// Ledger value at the current bar's close, including any open position.
    pub fn equity(&self) -> f64 {
        let price = self.series.bars()[self.current_step].close;
        self.ledger.mark_to_market(price)
    }

    /// Move to the next bar and apply `decision` there.
    pub fn advance(&mut self, decision: Decision) -> Result<StepOutcome, TradesimError> {
        if self.is_done() {
            return Err(TradesimError::invalid_call(
                "run is finished; reset before stepping again",
            ));
        }
        self.execute(self.current_step + 1, decision)
    }

    /// Apply `decision` at bar `index`. Bars must be visited in increasing
    /// order. On error no state is changed.
    pub fn execute(
        &mut self,
        index: usize,
        decision: Decision,
    ) -> Result<StepOutcome, TradesimError> {
        let series = self.series;
        let bar = series.bar(index).ok_or_else(|| {
            TradesimError::invalid_call(format!(
                "bar {index} is past the end of a {}-bar series",
                series.len()
            ))
        })?;
        if self.last_executed.is_some_and(|last| index <= last) {
            return Err(TradesimError::invalid_call(format!(
                "bar {index} already processed"
            )));
        }

        let price = bar.close;
        let transition = match decision {
            Decision::Buy if !self.ledger.is_long() => {
                let size = risk::size_with(self.ledger.balance(), price, &self.config.risk)?;
                self.ledger.open(price, size);
                let bracket = risk::bracket_for(price, &self.config.risk);
                debug!(
                    step = index,
                    price,
                    size,
                    stop = bracket.stop_price,
                    target = bracket.take_profit_price,
                    balance = self.ledger.balance(),
                    "opened long"
                );
                Transition::Opened { price, size }
            }
            Decision::Sell => {
                let size = self.ledger.position_size();
                match self.ledger.close(price) {
                    Some(pnl) => {
                        debug!(
                            step = index,
                            price,
                            pnl,
                            balance = self.ledger.balance(),
                            "closed long"
                        );
                        Transition::Closed { price, size, pnl }
                    }
                    None => Transition::None,
                }
            }
            Decision::Buy | Decision::Hold => Transition::None,
        };

        let reward = match transition {
            Transition::Closed { pnl, .. } => pnl,
            _ => 0.0,
        };

        match transition {
            Transition::Opened { price, size } => self.recorder.record_trade(TradeRecord {
                side: TradeSide::Buy,
                price,
                size,
                balance_after: self.ledger.balance(),
                step_index: index,
                timestamp: bar.timestamp,
            }),
            Transition::Closed { price, size, .. } => self.recorder.record_trade(TradeRecord {
                side: TradeSide::Sell,
                price,
                size,
                balance_after: self.ledger.balance(),
                step_index: index,
                timestamp: bar.timestamp,
            }),
            Transition::None => {}
        }

        self.current_step = index;
        self.last_executed = Some(index);
        self.recorder
            .record_equity(index, bar.timestamp, self.ledger.mark_to_market(price));

        Ok(StepOutcome {
            step_index: index,
            decision,
            transition,
            reward,
            done: self.is_done(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::PositionState;
    use crate::domain::ohlcv::Bar;
    use chrono::NaiveDate;

    fn make_series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::minutes(5 * i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn config() -> SimulationConfig {
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

    #[test]
    fn decision_from_action() {
        assert_eq!(Decision::try_from(0).unwrap(), Decision::Hold);
        assert_eq!(Decision::try_from(1).unwrap(), Decision::Buy);
        assert_eq!(Decision::try_from(2).unwrap(), Decision::Sell);
        assert!(matches!(
            Decision::try_from(3),
            Err(TradesimError::InvalidCall { .. })
        ));
        assert_eq!(Decision::Sell.action(), 2);
    }

    #[test]
    fn rejects_non_positive_balance() {
        let series = make_series(&[100.0]);
        let cfg = SimulationConfig {
            initial_balance: 0.0,
            ..config()
        };
        assert!(matches!(
            ExecutionEngine::new(&series, cfg),
            Err(TradesimError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn buy_hold_sell_scenario() {
        let series = make_series(&[100.0, 110.0, 105.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();

        let open = engine.execute(0, Decision::Buy).unwrap();
        assert_eq!(
            open.transition,
            Transition::Opened {
                price: 100.0,
                size: 100.0
            }
        );
        assert_eq!(open.reward, 0.0);
        assert!(!open.done);

        let hold = engine.execute(1, Decision::Hold).unwrap();
        assert_eq!(hold.reward, 0.0);

        let close = engine.execute(2, Decision::Sell).unwrap();
        assert!((close.reward - 500.0).abs() < 1e-9);
        assert!(close.done);
        assert!((engine.ledger().balance() - 1500.0).abs() < 1e-9);
        assert_eq!(engine.recorder().trade_count(), 2);
    }

    #[test]
    fn sell_while_flat_is_noop() {
        let series = make_series(&[100.0, 101.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();
        let before = engine.ledger().clone();

        let outcome = engine.advance(Decision::Sell).unwrap();
        assert_eq!(outcome.transition, Transition::None);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(engine.ledger(), &before);
        assert!(engine.recorder().trades().is_empty());
    }

    #[test]
    fn buy_while_long_does_not_average_in() {
        let series = make_series(&[100.0, 100.0, 120.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();
        engine.advance(Decision::Buy).unwrap();
        let before = engine.ledger().clone();

        let outcome = engine.advance(Decision::Buy).unwrap();
        assert_eq!(outcome.transition, Transition::None);
        assert_eq!(engine.ledger(), &before);
        assert_eq!(
            engine.ledger().position(),
            PositionState::Long { entry_price: 100.0 }
        );
    }

    #[test]
    fn invalid_risk_leaves_state_untouched() {
        let series = make_series(&[100.0, 101.0]);
        let cfg = SimulationConfig {
            risk: RiskParameters {
                stop_loss_fraction: 0.0,
                ..config().risk
            },
            ..config()
        };
        let mut engine = ExecutionEngine::new(&series, cfg).unwrap();
        let before = engine.ledger().clone();

        let err = engine.advance(Decision::Buy).unwrap_err();
        assert!(matches!(err, TradesimError::InvalidRisk { .. }));
        assert_eq!(engine.ledger(), &before);
        assert_eq!(engine.current_step(), 0);
        assert!(engine.recorder().equity_curve().is_empty());
    }

    #[test]
    fn advance_after_done_is_invalid_call() {
        let series = make_series(&[100.0, 101.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();
        assert!(engine.advance(Decision::Hold).unwrap().done);
        assert!(matches!(
            engine.advance(Decision::Hold),
            Err(TradesimError::InvalidCall { .. })
        ));
    }

    #[test]
    fn execute_rejects_revisiting_a_bar() {
        let series = make_series(&[100.0, 101.0, 102.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();
        engine.execute(1, Decision::Hold).unwrap();
        assert!(engine.execute(1, Decision::Hold).is_err());
        assert!(engine.execute(0, Decision::Hold).is_err());
        assert!(engine.execute(5, Decision::Hold).is_err());
    }

    #[test]
    fn open_position_is_not_closed_at_end() {
        let series = make_series(&[100.0, 100.0, 110.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();
        engine.advance(Decision::Buy).unwrap();
        let last = engine.advance(Decision::Hold).unwrap();

        assert!(last.done);
        assert!(engine.ledger().is_long());
        // balance excludes the open position; equity includes it
        assert!((engine.ledger().balance() - (1000.0 - 100.0 * 100.0)).abs() < 1e-9);
        assert!((engine.equity() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_initial_state() {
        let series = make_series(&[100.0, 110.0, 120.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();
        engine.advance(Decision::Buy).unwrap();
        engine.advance(Decision::Sell).unwrap();

        engine.reset();
        assert_eq!(engine.current_step(), 0);
        assert_eq!(engine.ledger(), &PositionLedger::new(1000.0));
        assert!(engine.recorder().trades().is_empty());
        assert!(!engine.is_done());
    }

    #[test]
    fn records_equity_each_step() {
        let series = make_series(&[100.0, 100.0, 110.0]);
        let mut engine = ExecutionEngine::new(&series, config()).unwrap();
        engine.advance(Decision::Buy).unwrap();
        engine.advance(Decision::Hold).unwrap();

        let curve = engine.recorder().equity_curve();
        assert_eq!(curve.len(), 2);
        assert!((curve[0].equity - 1000.0).abs() < 1e-9);
        assert!((curve[1].equity - 2000.0).abs() < 1e-9);
    }
}
