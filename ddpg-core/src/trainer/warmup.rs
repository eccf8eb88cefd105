//! Switching from random actions to the agent after a warm-up period.
use crate::{Env, Policy, UniformRandomPolicy};
use anyhow::Result;
use std::marker::PhantomData;

/// Acting policy of the training loop.
///
/// Routes every action-selection call with a global environment step index
/// below `start_steps` to a [`UniformRandomPolicy`], and every later call to
/// the wrapped policy, typically an agent in training mode.
pub struct WarmupPolicy<'a, E, P> {
    random: &'a mut UniformRandomPolicy,
    policy: &'a mut P,
    start_steps: usize,
    env_steps: usize,
    phantom: PhantomData<E>,
}

impl<'a, E, P> WarmupPolicy<'a, E, P>
where
    E: Env,
    P: Policy<E>,
{
    /// Wraps the policies. `env_steps` is the number of environment steps
    /// taken before this policy is used.
    pub fn new(
        random: &'a mut UniformRandomPolicy,
        policy: &'a mut P,
        start_steps: usize,
        env_steps: usize,
    ) -> Self {
        Self {
            random,
            policy,
            start_steps,
            env_steps,
            phantom: PhantomData,
        }
    }

    /// Returns the number of environment steps, including those taken with
    /// this policy.
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    /// Returns `true` if the next action comes from the random policy.
    pub fn is_warming_up(&self) -> bool {
        self.env_steps < self.start_steps
    }
}

impl<'a, E, P> Policy<E> for WarmupPolicy<'a, E, P>
where
    E: Env,
    P: Policy<E>,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let act = if self.is_warming_up() {
            Policy::<E>::sample(self.random, obs)?
        } else {
            self.policy.sample(obs)?
        };
        self.env_steps += 1;
        Ok(act)
    }

    fn reset(&mut self) {
        self.policy.reset();
    }
}
