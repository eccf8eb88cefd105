//! Evaluate [`Policy`].
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate [`Policy`].
pub trait Evaluator<E: Env> {
    /// Evaluate [`Policy`] over `n_episodes` episodes, discounting rewards
    /// with `discount`.
    ///
    /// The caller of this method needs to handle the internal state of `policy`,
    /// like training/evaluation mode.
    fn evaluate<P: Policy<E>>(
        &mut self,
        policy: &mut P,
        n_episodes: usize,
        discount: f32,
    ) -> Result<Record>;
}
