//! Environment.
use super::{Act, Info, Obs, Step};
use crate::{error::DdpgError, record::Record};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Dimensions and action bound of an environment.
///
/// Read once when an agent or a replay buffer is constructed; every
/// transition must conform to it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EnvSpec {
    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Actions are bounded componentwise by `[-max_action, max_action]`.
    pub max_action: f32,
}

impl EnvSpec {
    /// Checks that both dimensions are positive and that `max_action` is
    /// positive and finite.
    pub fn validate(&self) -> Result<(), DdpgError> {
        if self.obs_dim == 0 || self.act_dim == 0 {
            return Err(DdpgError::Configuration(format!(
                "dimensions must be positive, got obs_dim = {}, act_dim = {}",
                self.obs_dim, self.act_dim
            )));
        }
        if !(self.max_action.is_finite() && self.max_action > 0.0) {
            return Err(DdpgError::Configuration(format!(
                "max_action must be positive and finite, got {}",
                self.max_action
            )));
        }
        Ok(())
    }
}

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Returns the specification of the environment.
    fn spec(&self) -> EnvSpec;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Starts a new episode and returns its initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a random seed,
    /// which is useful when evaluation of a trained agent. Actually, this method is called
    /// in [`DefaultEvaluator`] so that every evaluation runs on the same initial states.
    ///
    /// [`DefaultEvaluator`]: crate::DefaultEvaluator
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;
}
