//! Collection of complete episodes.
use crate::{
    replay_buffer::{EpisodeBatch, Transition},
    Act, Env, Obs, Policy,
};
use anyhow::Result;
use log::trace;

/// Runs episodes on an environment with a given acting policy.
///
/// Every call of [`Sampler::collect_episodes`] runs each episode to its end,
/// so the returned batch never holds partial episodes.
pub struct Sampler<E: Env> {
    env: E,
}

impl<E: Env> Sampler<E> {
    /// Creates a new sampler with the given environment.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Returns a reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Runs `n_episodes` episodes with `policy` and returns their transitions.
    ///
    /// `itr` is the index of the training cycle and is only used for logging.
    ///
    /// The last transition of a truncated episode is stored with
    /// `is_terminated == false`, so its value is still bootstrapped.
    pub fn collect_episodes<P: Policy<E>>(
        &mut self,
        itr: usize,
        policy: &mut P,
        n_episodes: usize,
    ) -> Result<EpisodeBatch> {
        let mut batch = EpisodeBatch::default();

        for _ in 0..n_episodes {
            let mut prev_obs = self.env.reset()?;
            policy.reset();
            let mut r_total = 0f32;
            let mut len = 0;

            loop {
                let act = policy.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act);
                r_total += step.reward;
                len += 1;

                let is_done = step.is_done();
                batch.transitions.push(Transition {
                    obs: prev_obs.as_slice().to_vec(),
                    act: step.act.as_slice().to_vec(),
                    reward: step.reward,
                    next_obs: step.obs.as_slice().to_vec(),
                    is_terminated: step.is_terminated,
                });

                if is_done {
                    break;
                }
                prev_obs = step.obs;
            }

            batch.episode_returns.push(r_total);
            batch.episode_lengths.push(len);
        }

        trace!(
            "itr {}: collected {} episodes, {} transitions",
            itr,
            batch.n_episodes(),
            batch.len()
        );
        Ok(batch)
    }
}
