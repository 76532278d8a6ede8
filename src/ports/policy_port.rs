//! Decision source port for the interactive environment.

use crate::domain::engine::Decision;

/// Something that picks an action from an observation: a trained agent, a
/// rule, or a baseline.
pub trait Policy {
    fn name(&self) -> &str;

    fn act(&mut self, observation: &[f32]) -> Decision;

    /// Called at the start of every episode.
    fn reset(&mut self, _seed: Option<u64>) {}
}
