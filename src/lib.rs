//! tradesim: trade execution and account state simulator.
//!
//! One execution engine drives both an offline signal backtest and an
//! interactive reset/step environment. Hexagonal layout: domain logic in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
