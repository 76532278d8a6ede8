//! Append-only trade log and equity curve.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub side: TradeSide,
    pub price: f64,
    pub size: f64,
    pub balance_after: f64,
    pub step_index: usize,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub step_index: usize,
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// A completed Buy→Sell pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub size: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_step: usize,
    pub exit_step: usize,
    pub pnl: f64,
}

impl RoundTrip {
    pub fn bars_held(&self) -> usize {
        self.exit_step - self.entry_step
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecorder {
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    pub fn record_equity(&mut self, step_index: usize, timestamp: NaiveDateTime, equity: f64) {
        self.equity_curve.push(EquityPoint {
            step_index,
            timestamp,
            equity,
        });
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Pair each Sell with the Buy before it. A trailing unmatched Buy is an
    /// open position and is not included.
    pub fn round_trips(&self) -> Vec<RoundTrip> {
        let mut trips = Vec::new();
        let mut entry: Option<&TradeRecord> = None;

        for trade in &self.trades {
            match trade.side {
                TradeSide::Buy => entry = Some(trade),
                TradeSide::Sell => {
                    if let Some(open) = entry.take() {
                        trips.push(RoundTrip {
                            size: open.size,
                            entry_price: open.price,
                            exit_price: trade.price,
                            entry_step: open.step_index,
                            exit_step: trade.step_index,
                            pnl: open.size * (trade.price - open.price),
                        });
                    }
                }
            }
        }

        trips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(step: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * step as i64)
    }

    fn trade(side: TradeSide, price: f64, step: usize) -> TradeRecord {
        TradeRecord {
            side,
            price,
            size: 10.0,
            balance_after: 0.0,
            step_index: step,
            timestamp: ts(step),
        }
    }

    #[test]
    fn new_recorder_is_empty() {
        let recorder = ResultRecorder::new();
        assert!(recorder.trades().is_empty());
        assert!(recorder.equity_curve().is_empty());
        assert_eq!(recorder.trade_count(), 0);
    }

    #[test]
    fn records_in_order() {
        let mut recorder = ResultRecorder::new();
        recorder.record_trade(trade(TradeSide::Buy, 100.0, 1));
        recorder.record_trade(trade(TradeSide::Sell, 105.0, 4));
        recorder.record_equity(1, ts(1), 1000.0);

        assert_eq!(recorder.trade_count(), 2);
        assert_eq!(recorder.trades()[0].side, TradeSide::Buy);
        assert_eq!(recorder.trades()[1].step_index, 4);
        assert_eq!(recorder.equity_curve()[0].equity, 1000.0);
    }

    #[test]
    fn round_trips_pair_buys_and_sells() {
        let mut recorder = ResultRecorder::new();
        recorder.record_trade(trade(TradeSide::Buy, 100.0, 1));
        recorder.record_trade(trade(TradeSide::Sell, 105.0, 4));
        recorder.record_trade(trade(TradeSide::Buy, 110.0, 6));
        recorder.record_trade(trade(TradeSide::Sell, 100.0, 9));
        recorder.record_trade(trade(TradeSide::Buy, 90.0, 10));

        let trips = recorder.round_trips();
        assert_eq!(trips.len(), 2);
        assert!((trips[0].pnl - 50.0).abs() < 1e-9);
        assert_eq!(trips[0].bars_held(), 3);
        assert!((trips[1].pnl - (-100.0)).abs() < 1e-9);
    }

    #[test]
    fn side_display() {
        assert_eq!(TradeSide::Buy.to_string(), "BUY");
        assert_eq!(TradeSide::Sell.to_string(), "SELL");
    }
}
