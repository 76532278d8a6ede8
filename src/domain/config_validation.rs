//! Configuration validation.
//!
//! Validates all config fields before a run. Missing optional keys fall back
//! to the same defaults the CLI builds with.

use crate::domain::engine::SimulationConfig;
use crate::domain::error::TradesimError;
use crate::domain::metrics::DEFAULT_PERIODS_PER_YEAR;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TIMEFRAME: &str = "5m";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_FAST_PERIOD: i64 = 10;
pub const DEFAULT_SLOW_PERIOD: i64 = 20;
pub const DEFAULT_EPISODES: i64 = 10;
pub const DEFAULT_POLICY: &str = "random";
pub const POLICIES: [&str; 3] = ["hold", "random", "signal"];

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let defaults = SimulationConfig::default();

    let balance = config.double_or("simulation", "initial_balance", defaults.initial_balance)?;
    if !(balance > 0.0) {
        return Err(invalid(
            "simulation",
            "initial_balance",
            "initial_balance must be positive",
        ));
    }

    let leverage = config.double_or("simulation", "leverage", defaults.leverage)?;
    if !(leverage >= 1.0) {
        return Err(invalid(
            "simulation",
            "leverage",
            "leverage must be at least 1",
        ));
    }

    let risk = config.double_or("simulation", "risk_fraction", defaults.risk.risk_fraction)?;
    if !(risk > 0.0 && risk < 1.0) {
        return Err(invalid(
            "simulation",
            "risk_fraction",
            "risk_fraction must be between 0 and 1",
        ));
    }

    let stop = config.double_or(
        "simulation",
        "stop_loss_fraction",
        defaults.risk.stop_loss_fraction,
    )?;
    if !(stop > 0.0 && stop < 1.0) {
        return Err(invalid(
            "simulation",
            "stop_loss_fraction",
            "stop_loss_fraction must be between 0 and 1",
        ));
    }

    let ratio = config.double_or(
        "simulation",
        "reward_risk_ratio",
        defaults.risk.reward_risk_ratio,
    )?;
    if !(ratio > 0.0) {
        return Err(invalid(
            "simulation",
            "reward_risk_ratio",
            "reward_risk_ratio must be positive",
        ));
    }

    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    match config.get_string("data", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TradesimError::ConfigMissing {
            section: "data".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let fast = config.int_or("strategy", "fast_period", DEFAULT_FAST_PERIOD)?;
    if fast < 1 {
        return Err(invalid(
            "strategy",
            "fast_period",
            "fast_period must be at least 1",
        ));
    }

    let slow = config.int_or("strategy", "slow_period", DEFAULT_SLOW_PERIOD)?;
    if slow <= fast {
        return Err(invalid(
            "strategy",
            "slow_period",
            "slow_period must be greater than fast_period",
        ));
    }

    if let Some(column) = config.get_string("strategy", "signal_column") {
        if column.trim().is_empty() {
            return Err(invalid(
                "strategy",
                "signal_column",
                "signal_column must name a CSV column",
            ));
        }
    }

    Ok(())
}

pub fn validate_environment_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    if let Some(width) = config.get_int("environment", "observation_width")? {
        if width < 1 {
            return Err(invalid(
                "environment",
                "observation_width",
                "observation_width must be a positive integer",
            ));
        }
    }

    if config.int_or("environment", "episodes", DEFAULT_EPISODES)? < 1 {
        return Err(invalid(
            "environment",
            "episodes",
            "episodes must be at least 1",
        ));
    }

    config.get_uint("environment", "seed")?;

    if let Some(policy) = config.get_string("environment", "policy") {
        if !POLICIES.contains(&policy.trim().to_lowercase().as_str()) {
            return Err(invalid(
                "environment",
                "policy",
                "policy must be one of hold, random, signal",
            ));
        }
    }

    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let periods = config.double_or("report", "periods_per_year", DEFAULT_PERIODS_PER_YEAR)?;
    if !(periods > 0.0) {
        return Err(invalid(
            "report",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

/// Everything a run needs: simulation, data, strategy, environment, report.
pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_simulation_config(config)?;
    validate_data_config(config)?;
    validate_strategy_config(config)?;
    validate_environment_config(config)?;
    validate_report_config(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
