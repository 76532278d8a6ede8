//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod ledger;
pub mod risk;
pub mod recorder;
pub mod engine;
pub mod signal;
pub mod backtest;
pub mod environment;
pub mod policy;
pub mod evaluation;
pub mod metrics;
pub mod config_validation;
pub mod error;
