//! Precomputed trading signals and the SMA crossover generator.
//!
//! A signal column holds one of {-1, 0, 1} per bar, mapped onto
//! {Sell, Hold, Buy}.

use crate::domain::engine::Decision;
use crate::domain::error::TradesimError;
use crate::domain::series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Sell,
    Hold,
    Buy,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    pub fn decision(self) -> Decision {
        match self {
            Signal::Sell => Decision::Sell,
            Signal::Hold => Decision::Hold,
            Signal::Buy => Decision::Buy,
        }
    }
}

impl TryFrom<i64> for Signal {
    type Error = TradesimError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::Hold),
            1 => Ok(Signal::Buy),
            other => Err(TradesimError::data(format!(
                "signal value {other} is outside {{-1, 0, 1}}"
            ))),
        }
    }
}

/// Parse a raw signal column.
pub fn parse_signals(values: &[i64]) -> Result<Vec<Signal>, TradesimError> {
    values.iter().map(|&v| Signal::try_from(v)).collect()
}

/// Read a precomputed signal column from the series' extra features.
pub fn signals_from_column(series: &PriceSeries, column: &str) -> Result<Vec<Signal>, TradesimError> {
    let values = series.extra_column(column).ok_or_else(|| {
        TradesimError::data(format!(
            "signal column '{column}' not found in {}",
            series.symbol()
        ))
    })?;

    let raw = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if v.is_finite() && v.fract() == 0.0 {
                Ok(v as i64)
            } else {
                Err(TradesimError::data(format!(
                    "signal column '{column}' row {}: {v} is not an integer",
                    i + 1
                )))
            }
        })
        .collect::<Result<Vec<i64>, _>>()?;

    parse_signals(&raw)
}

/// Simple moving average of `values`. The first `period - 1` entries are
/// `None` (warmup).
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }

    out
}

/// Buy where the fast SMA of closes is above the slow one, Sell where it is
/// below, Hold on ties and during warmup.
pub fn sma_crossover(series: &PriceSeries, fast: usize, slow: usize) -> Vec<Signal> {
    let closes = series.closes();
    let fast_sma = calculate_sma(&closes, fast);
    let slow_sma = calculate_sma(&closes, slow);

    fast_sma
        .iter()
        .zip(&slow_sma)
        .map(|pair| match pair {
            (Some(f), Some(s)) if f > s => Signal::Buy,
            (Some(f), Some(s)) if f < s => Signal::Sell,
            _ => Signal::Hold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn signal_values_round_trip() {
        for s in [Signal::Sell, Signal::Hold, Signal::Buy] {
            assert_eq!(Signal::try_from(s.value() as i64).unwrap(), s);
        }
    }

    #[test]
    fn signal_maps_to_decision() {
        assert_eq!(Signal::Sell.decision(), Decision::Sell);
        assert_eq!(Signal::Hold.decision(), Decision::Hold);
        assert_eq!(Signal::Buy.decision(), Decision::Buy);
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert!(parse_signals(&[0, 1, -1]).is_ok());
        assert!(matches!(
            parse_signals(&[0, 2]),
            Err(TradesimError::DataError { .. })
        ));
    }

    #[test]
    fn sma_warmup_and_values() {
        let sma = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(sma[0], None);
        assert_eq!(sma[1], None);
        assert!((sma[2].unwrap() - 2.0).abs() < 1e-12);
        assert!((sma[3].unwrap() - 3.0).abs() < 1e-12);
        assert!((sma[4].unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sma_zero_period_is_all_warmup() {
        assert!(calculate_sma(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn crossover_rising_then_falling() {
        let series = make_series(&[10.0, 11.0, 12.0, 13.0, 12.0, 10.0, 8.0]);
        let signals = sma_crossover(&series, 2, 3);

        assert_eq!(signals.len(), 7);
        assert_eq!(signals[0], Signal::Hold);
        assert_eq!(signals[1], Signal::Hold);
        // fast (12.5) > slow (12.0)
        assert_eq!(signals[3], Signal::Buy);
        // fast (9.0) < slow (10.0)
        assert_eq!(signals[6], Signal::Sell);
    }

    #[test]
    fn crossover_flat_prices_hold() {
        let series = make_series(&[5.0; 6]);
        let signals = sma_crossover(&series, 2, 4);
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn signals_read_from_extra_column() {
        let bars = make_series(&[100.0, 101.0, 102.0]).bars().to_vec();
        let series = PriceSeries::with_features(
            "X",
            bars,
            vec!["signal".into()],
            vec![vec![0.0], vec![1.0], vec![-1.0]],
        )
        .unwrap();
        assert_eq!(
            signals_from_column(&series, "signal").unwrap(),
            vec![Signal::Hold, Signal::Buy, Signal::Sell]
        );
        assert!(matches!(
            signals_from_column(&series, "missing"),
            Err(TradesimError::DataError { .. })
        ));
    }

    #[test]
    fn signal_column_rejects_fractions_and_gaps() {
        for bad in [0.5, f64::NAN, 2.0] {
            let series = PriceSeries::with_features(
                "X",
                make_series(&[100.0, 101.0]).bars().to_vec(),
                vec!["signal".into()],
                vec![vec![0.0], vec![bad]],
            )
            .unwrap();
            assert!(matches!(
                signals_from_column(&series, "signal"),
                Err(TradesimError::DataError { .. })
            ));
        }
    }
}
