//! Built-in baseline policies.

use crate::domain::engine::Decision;
use crate::domain::signal::Signal;
use crate::ports::policy_port::Policy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Always holds.
#[derive(Debug, Clone, Default)]
pub struct HoldPolicy;

impl Policy for HoldPolicy {
    fn name(&self) -> &str {
        "hold"
    }

    fn act(&mut self, _observation: &[f32]) -> Decision {
        Decision::Hold
    }
}

/// Uniform sample over the three actions.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    base_seed: u64,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        RandomPolicy {
            base_seed: seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn act(&mut self, _observation: &[f32]) -> Decision {
        match self.rng.gen_range(0..3u8) {
            0 => Decision::Hold,
            1 => Decision::Buy,
            _ => Decision::Sell,
        }
    }

    fn reset(&mut self, seed: Option<u64>) {
        self.rng = StdRng::seed_from_u64(seed.unwrap_or(self.base_seed));
    }
}

/// Replays a signal column the way the backtest does: the decision applied
/// on step `n` is the signal of bar `n`.
#[derive(Debug, Clone)]
pub struct SignalPolicy {
    signals: Vec<Signal>,
    cursor: usize,
}

impl SignalPolicy {
    pub fn new(signals: Vec<Signal>) -> Self {
        SignalPolicy { signals, cursor: 0 }
    }
}

impl Policy for SignalPolicy {
    fn name(&self) -> &str {
        "signal"
    }

    fn act(&mut self, _observation: &[f32]) -> Decision {
        self.cursor += 1;
        self.signals
            .get(self.cursor)
            .map(|s| s.decision())
            .unwrap_or(Decision::Hold)
    }

    fn reset(&mut self, _seed: Option<u64>) {
        self.cursor = 0;
    }
}
