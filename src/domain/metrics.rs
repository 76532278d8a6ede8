//! Performance metrics over a recorded run.

use super::recorder::ResultRecorder;

pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_bars_held: f64,
}

impl Metrics {
    /// `periods_per_year` annualizes per-bar returns (252 for daily bars).
    pub fn compute(recorder: &ResultRecorder, initial_balance: f64, periods_per_year: f64) -> Self {
        let equity_curve = recorder.equity_curve();
        let trips = recorder.round_trips();

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_balance);

        let total_return = if initial_balance > 0.0 {
            (final_equity - initial_balance) / initial_balance
        } else {
            0.0
        };

        let years = equity_curve.len() as f64 / periods_per_year;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0
        {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        // The curve starts at the first executed bar; the run starts from the initial balance.
        let equity: Vec<f64> = std::iter::once(initial_balance)
            .chain(equity_curve.iter().map(|p| p.equity))
            .collect();
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&equity);
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&equity, periods_per_year);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_bars = 0usize;

        for trip in &trips {
            let pnl = trip.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_bars += trip.bars_held();
        }

        let total_trades = trips.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_bars_held = if total_trades > 0 {
            total_bars as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_bars_held,
        }
    }
}

/// Annualized Sharpe of per-episode rewards: mean / stddev * sqrt(252).
/// Zero with fewer than two episodes or no dispersion.
pub fn episode_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let (mean, stddev) = mean_and_stddev(returns);
    if stddev == 0.0 {
        return 0.0;
    }
    mean / stddev * DEFAULT_PERIODS_PER_YEAR.sqrt()
}

/// Population mean and standard deviation.
pub fn mean_and_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn compute_drawdown(equity: &[f64]) -> (f64, usize) {
    if equity.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity[0];
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for &value in equity {
        if value > peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            max_dd = max_dd.max(dd);
            if dd > 0.0 {
                current_dd_duration += 1;
                max_dd_duration = max_dd_duration.max(current_dd_duration);
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(equity: &[f64], periods_per_year: f64) -> (f64, f64) {
    if equity.len() < 2 {
        return (0.0, 0.0);
    }

    // Leveraged runs can push equity through zero; those bars carry no return.
    let returns: Vec<f64> = equity
        .windows(2)
        .map(|w| {
            let prev = w[0];
            let curr = w[1];
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let (mean, stddev) = mean_and_stddev(&returns);
    let annualizer = periods_per_year.sqrt();

    let sharpe = if stddev > 0.0 {
        mean / stddev * annualizer
    } else {
        0.0
    };

    let downside_sq: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        mean / downside_stddev * annualizer
    } else {
        0.0
    };

    (sharpe, sortino)
}
