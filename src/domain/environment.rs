//! Interactive reset/step environment over the execution engine.
//!
//! Actions are `0 = Hold, 1 = Buy, 2 = Sell`. The observation is the feature
//! row of the current bar (every column except the timestamp) as `f32`.
//! Its width is fixed when the environment is built.

use crate::domain::engine::{Decision, ExecutionEngine, SimulationConfig, StepOutcome};
use crate::domain::error::TradesimError;
use crate::domain::ledger::PositionLedger;
use crate::domain::series::PriceSeries;

pub type Observation = Vec<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeState {
    pub current_step: usize,
    pub done: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeStats {
    pub total_reward: f64,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone)]
pub struct TradingEnv<'a> {
    engine: ExecutionEngine<'a>,
    observation_width: usize,
    episode: EpisodeState,
    stats: EpisodeStats,
}

impl<'a> TradingEnv<'a> {
    /// Build an environment. `observation_width` defaults to the series'
    /// feature width; an explicit width that disagrees is a `ShapeMismatch`.
    pub fn new(
        series: &'a PriceSeries,
        config: SimulationConfig,
        observation_width: Option<usize>,
    ) -> Result<Self, TradesimError> {
        let actual = series.feature_width();
        let observation_width = observation_width.unwrap_or(actual);
        if observation_width != actual {
            return Err(TradesimError::ShapeMismatch {
                expected: observation_width,
                actual,
            });
        }

        let engine = ExecutionEngine::new(series, config)?;
        let done = engine.is_done();
        Ok(TradingEnv {
            engine,
            observation_width,
            episode: EpisodeState {
                current_step: 0,
                done,
                seed: None,
            },
            stats: EpisodeStats::default(),
        })
    }

    pub fn observation_width(&self) -> usize {
        self.observation_width
    }

    pub fn action_count(&self) -> usize {
        3
    }

    pub fn episode(&self) -> EpisodeState {
        self.episode
    }

    pub fn stats(&self) -> EpisodeStats {
        self.stats
    }

    pub fn ledger(&self) -> &PositionLedger {
        self.engine.ledger()
    }

    pub fn engine(&self) -> &ExecutionEngine<'a> {
        &self.engine
    }

    /// Start a new episode at bar 0 with a fresh ledger.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Observation, TradesimError> {
        self.engine.reset();
        self.episode = EpisodeState {
            current_step: 0,
            done: self.engine.is_done(),
            seed,
        };
        self.stats = EpisodeStats::default();
        self.observation(0)
    }

    /// Advance one bar and apply `decision` there.
    pub fn step(&mut self, decision: Decision) -> Result<StepResult, TradesimError> {
        if self.episode.done {
            return Err(TradesimError::invalid_call(
                "episode is done; call reset before step",
            ));
        }

        let outcome = self.engine.advance(decision)?;
        let observation = self.observation(outcome.step_index)?;

        self.episode.current_step = outcome.step_index;
        self.episode.done = outcome.done;
        self.stats.total_reward += outcome.reward;
        self.stats.length += 1;

        Ok(StepResult {
            observation,
            reward: outcome.reward,
            done: outcome.done,
            outcome,
        })
    }

    /// `step` with a raw action index.
    pub fn step_action(&mut self, action: u8) -> Result<StepResult, TradesimError> {
        self.step(Decision::try_from(action)?)
    }

    /// One-line summary of the current state.
    pub fn status(&self) -> String {
        let position = match self.ledger().position().entry_price() {
            Some(entry) => format!("long {:.4} @ {:.2}", self.ledger().position_size(), entry),
            None => "flat".to_string(),
        };
        format!(
            "step {} | balance {:.2} | position {} | equity {:.2}",
            self.episode.current_step,
            self.ledger().balance(),
            position,
            self.engine.equity(),
        )
    }

    fn observation(&self, index: usize) -> Result<Observation, TradesimError> {
        let row = self
            .engine
            .series()
            .feature_row(index)
            .ok_or_else(|| TradesimError::invalid_call(format!("no bar at index {index}")))?;
        if row.len() != self.observation_width {
            return Err(TradesimError::ShapeMismatch {
                expected: self.observation_width,
                actual: row.len(),
            });
        }
        Ok(row.into_iter().map(|v| v as f32).collect())
    }
}
