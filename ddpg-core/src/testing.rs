//! A small continuous-control environment for tests and demos.
//!
//! [`PointEnv`] moves a point in `dim`-dimensional space towards the origin.
//! An action is a velocity clipped to `[-max_action, max_action]`; the reward
//! is the negative distance to the origin after the move. An episode
//! terminates when the point gets within `goal_radius` of the origin, and is
//! truncated after `max_steps` steps.
use crate::{record::Record, Act, Env, EnvSpec, Obs, Step};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Observation of [`PointEnv`], the position of the point.
#[derive(Clone, Debug, PartialEq)]
pub struct PointObs(pub Vec<f32>);

impl Obs for PointObs {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Action of [`PointEnv`], the velocity of the point.
#[derive(Clone, Debug, PartialEq)]
pub struct PointAct(pub Vec<f32>);

impl From<Vec<f32>> for PointAct {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

impl Act for PointAct {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Configuration of [`PointEnv`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PointEnvConfig {
    /// Dimension of the space.
    pub dim: usize,

    /// Maximum number of steps in an episode.
    pub max_steps: usize,

    /// Bound of each action component.
    pub max_action: f32,

    /// Scale from actions to displacements.
    pub step_size: f32,

    /// Episodes terminate within this distance from the origin.
    pub goal_radius: f32,
}

impl Default for PointEnvConfig {
    fn default() -> Self {
        Self {
            dim: 2,
            max_steps: 50,
            max_action: 1.0,
            step_size: 0.1,
            goal_radius: 0.05,
        }
    }
}

impl PointEnvConfig {
    /// Sets the dimension of the space.
    pub fn dim(mut self, v: usize) -> Self {
        self.dim = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the action bound.
    pub fn max_action(mut self, v: f32) -> Self {
        self.max_action = v;
        self
    }

    /// Sets the radius of the goal region.
    pub fn goal_radius(mut self, v: f32) -> Self {
        self.goal_radius = v;
        self
    }
}

/// Point-mass environment, see the [module documentation](self).
pub struct PointEnv {
    config: PointEnvConfig,
    seed: u64,
    rng: StdRng,
    pos: Vec<f32>,
    n_steps: usize,
}

impl PointEnv {
    fn init_pos(rng: &mut StdRng, dim: usize) -> Vec<f32> {
        (0..dim).map(|_| rng.gen_range(-1f32..=1f32)).collect()
    }

    fn dist(&self) -> f32 {
        self.pos.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

impl Env for PointEnv {
    type Config = PointEnvConfig;
    type Obs = PointObs;
    type Act = PointAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let seed = seed as u64;
        let env = Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            pos: vec![0.; config.dim],
            n_steps: 0,
        };
        env.spec().validate()?;
        Ok(env)
    }

    fn spec(&self) -> EnvSpec {
        EnvSpec {
            obs_dim: self.config.dim,
            act_dim: self.config.dim,
            max_action: self.config.max_action,
        }
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let max_action = self.config.max_action;
        for (x, &v) in self.pos.iter_mut().zip(a.0.iter()) {
            *x += self.config.step_size * v.clamp(-max_action, max_action);
        }
        self.n_steps += 1;

        let dist = self.dist();
        let is_terminated = dist < self.config.goal_radius;
        let is_truncated = !is_terminated && self.n_steps >= self.config.max_steps;
        let step = Step::new(
            PointObs(self.pos.clone()),
            a.clone(),
            -dist,
            is_terminated,
            is_truncated,
            (),
        );

        (step, Record::empty())
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.pos = Self::init_pos(&mut self.rng, self.config.dim);
        self.n_steps = 0;
        Ok(PointObs(self.pos.clone()))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        self.pos = Self::init_pos(&mut rng, self.config.dim);
        self.n_steps = 0;
        Ok(PointObs(self.pos.clone()))
    }
}
