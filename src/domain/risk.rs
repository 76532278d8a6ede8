//! Risk-based position sizing.
//!
//! size = (risk_fraction * balance) / (entry_price - stop_price)
//! stop_price = entry_price * (1 - stop_loss_fraction)

use crate::domain::error::TradesimError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParameters {
    pub risk_fraction: f64,
    pub stop_loss_fraction: f64,
    pub reward_risk_ratio: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        RiskParameters {
            risk_fraction: 0.02,
            stop_loss_fraction: 0.01,
            reward_risk_ratio: 2.0,
        }
    }
}

/// Stop-loss and take-profit levels implied by an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub stop_price: f64,
    pub take_profit_price: f64,
}

/// Position size risking `risk_fraction` of `balance` down to the stop.
///
/// Fails with `InvalidRisk` if the stop is not below the entry or the result
/// would not be a strictly positive, finite size.
pub fn size_for(
    balance: f64,
    entry_price: f64,
    risk_fraction: f64,
    stop_loss_fraction: f64,
) -> Result<f64, TradesimError> {
    let risk_amount = risk_fraction * balance;
    let stop_price = entry_price * (1.0 - stop_loss_fraction);

    if entry_price <= stop_price {
        return Err(TradesimError::invalid_risk(format!(
            "stop price {stop_price} is not below entry price {entry_price}"
        )));
    }

    let size = risk_amount / (entry_price - stop_price);
    if !size.is_finite() || size <= 0.0 {
        return Err(TradesimError::invalid_risk(format!(
            "position size {size} from balance {balance} is not positive"
        )));
    }
    Ok(size)
}

/// `size_for` with the fractions taken from `params`.
pub fn size_with(
    balance: f64,
    entry_price: f64,
    params: &RiskParameters,
) -> Result<f64, TradesimError> {
    size_for(
        balance,
        entry_price,
        params.risk_fraction,
        params.stop_loss_fraction,
    )
}

pub fn bracket_for(entry_price: f64, params: &RiskParameters) -> Bracket {
    let stop_distance = entry_price * params.stop_loss_fraction;
    Bracket {
        stop_price: entry_price - stop_distance,
        take_profit_price: entry_price + stop_distance * params.reward_risk_ratio,
    }
}
