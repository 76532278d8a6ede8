//! Runs a policy through full environment episodes.

use crate::domain::environment::TradingEnv;
use crate::domain::error::TradesimError;
use crate::domain::metrics::{episode_sharpe, mean_and_stddev};
use crate::ports::policy_port::Policy;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub total_reward: f64,
    pub length: usize,
    pub final_balance: f64,
    pub final_equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub policy: String,
    pub episodes: Vec<EpisodeSummary>,
    pub mean_reward: f64,
    pub std_reward: f64,
    pub sharpe_ratio: f64,
}

impl EvaluationSummary {
    pub fn rewards(&self) -> Vec<f64> {
        self.episodes.iter().map(|e| e.total_reward).collect()
    }
}

/// Play `episodes` full episodes. Episode `i` is reset with `seed + i` when a
/// seed is given.
pub fn evaluate_policy(
    env: &mut TradingEnv<'_>,
    policy: &mut dyn Policy,
    episodes: usize,
    seed: Option<u64>,
) -> Result<EvaluationSummary, TradesimError> {
    if episodes == 0 {
        return Err(TradesimError::invalid_call("episode count must be positive"));
    }

    let mut summaries = Vec::with_capacity(episodes);

    for i in 0..episodes {
        let episode_seed = seed.map(|s| s.wrapping_add(i as u64));
        let mut observation = env.reset(episode_seed)?;
        policy.reset(episode_seed);

        while !env.episode().done {
            let decision = policy.act(&observation);
            let result = env.step(decision)?;
            observation = result.observation;
        }

        let stats = env.stats();
        debug!(episode = i, reward = stats.total_reward, steps = stats.length, "episode finished");
        summaries.push(EpisodeSummary {
            total_reward: stats.total_reward,
            length: stats.length,
            final_balance: env.ledger().balance(),
            final_equity: env.engine().equity(),
        });
    }

    let rewards: Vec<f64> = summaries.iter().map(|e| e.total_reward).collect();
    let (mean_reward, std_reward) = mean_and_stddev(&rewards);
    let sharpe_ratio = episode_sharpe(&rewards);

    info!(
        policy = policy.name(),
        episodes,
        mean_reward,
        std_reward,
        "evaluation finished"
    );

    Ok(EvaluationSummary {
        policy: policy.name().to_string(),
        episodes: summaries,
        mean_reward,
        std_reward,
        sharpe_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::SimulationConfig;
    use crate::domain::ohlcv::Bar;
    use crate::domain::policy::{HoldPolicy, RandomPolicy};
    use crate::domain::series::PriceSeries;
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
    fn hold_policy_earns_nothing() {
        let series = make_series(&[100.0, 101.0, 99.0, 102.0]);
        let mut env = TradingEnv::new(&series, SimulationConfig::default(), None).unwrap();
        let summary = evaluate_policy(&mut env, &mut HoldPolicy, 3, None).unwrap();

        assert_eq!(summary.episodes.len(), 3);
        assert!(summary.episodes.iter().all(|e| e.length == 3));
        assert_eq!(summary.mean_reward, 0.0);
        assert_eq!(summary.std_reward, 0.0);
        assert_eq!(summary.sharpe_ratio, 0.0);
        assert_eq!(summary.policy, "hold");
    }

    #[test]
    fn seeded_random_evaluation_is_reproducible() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 7) as f64).collect();
        let series = make_series(&closes);
        let mut env = TradingEnv::new(&series, SimulationConfig::default(), None).unwrap();

        let first = evaluate_policy(&mut env, &mut RandomPolicy::new(1), 4, Some(9)).unwrap();
        let second = evaluate_policy(&mut env, &mut RandomPolicy::new(1), 4, Some(9)).unwrap();
        assert_eq!(first.rewards(), second.rewards());
    }

    #[test]
    fn zero_episodes_is_invalid() {
        let series = make_series(&[100.0, 101.0]);
        let mut env = TradingEnv::new(&series, SimulationConfig::default(), None).unwrap();
        assert!(matches!(
            evaluate_policy(&mut env, &mut HoldPolicy, 0, None),
            Err(TradesimError::InvalidCall { .. })
        ));
    }
}
