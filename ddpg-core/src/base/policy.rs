//! Policy.
use super::{Env, EnvSpec};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy<E: Env> {
    /// Sample an action given an observation.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act>;

    /// Called at the start of every episode.
    ///
    /// Policies with per-episode state, such as temporally correlated
    /// exploration noise, reset it here.
    fn reset(&mut self) {}
}

/// Samples actions uniformly from `[-max_action, max_action]^act_dim`,
/// ignoring observations.
///
/// Used during the warm-up period of training, before the learned policy
/// has any influence on data collection.
pub struct UniformRandomPolicy {
    act_dim: usize,
    max_action: f32,
    rng: StdRng,
}

impl UniformRandomPolicy {
    /// Constructs the policy for the action space of `spec`.
    pub fn new(spec: &EnvSpec, seed: u64) -> Self {
        Self {
            act_dim: spec.act_dim,
            max_action: spec.max_action,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn sample_vec(&mut self) -> Vec<f32> {
        let max_action = self.max_action;
        (0..self.act_dim)
            .map(|_| self.rng.gen_range(-max_action..=max_action))
            .collect()
    }
}

impl<E: Env> Policy<E> for UniformRandomPolicy {
    fn sample(&mut self, _obs: &E::Obs) -> Result<E::Act> {
        Ok(self.sample_vec().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_random_policy_bounds() {
        let spec = EnvSpec {
            obs_dim: 3,
            act_dim: 2,
            max_action: 0.5,
        };
        let mut policy = UniformRandomPolicy::new(&spec, 42);

        for _ in 0..1000 {
            let a = policy.sample_vec();
            assert_eq!(a.len(), 2);
            assert!(a.iter().all(|v| v.abs() <= 0.5));
        }
    }

    #[test]
    fn test_uniform_random_policy_is_seeded() {
        let spec = EnvSpec {
            obs_dim: 1,
            act_dim: 4,
            max_action: 2.0,
        };
        let mut p1 = UniformRandomPolicy::new(&spec, 7);
        let mut p2 = UniformRandomPolicy::new(&spec, 7);
        assert_eq!(p1.sample_vec(), p2.sample_vec());
    }
}
