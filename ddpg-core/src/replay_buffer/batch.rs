//! Transitions and batches of them.
use serde::{Deserialize, Serialize};

/// A transition `(o_t, a_t, r_t, o_t+1, terminal_t)`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transition {
    /// Observation.
    pub obs: Vec<f32>,

    /// Action.
    pub act: Vec<f32>,

    /// Reward.
    pub reward: f32,

    /// Next observation.
    pub next_obs: Vec<f32>,

    /// The next observation is a terminal state.
    ///
    /// Transitions at which an episode was truncated have `false` here.
    pub is_terminated: bool,
}

/// Transitions of one or more complete episodes, in the order they were
/// collected.
#[derive(Debug, Clone, Default)]
pub struct EpisodeBatch {
    /// Transitions.
    pub transitions: Vec<Transition>,

    /// Undiscounted return of each episode.
    pub episode_returns: Vec<f32>,

    /// Number of steps of each episode.
    pub episode_lengths: Vec<usize>,
}

impl EpisodeBatch {
    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Returns the number of episodes.
    pub fn n_episodes(&self) -> usize {
        self.episode_lengths.len()
    }
}

/// A batch of transitions sampled from a replay buffer.
///
/// Vector-valued fields are stored row-major, so `obs` has
/// `len() * obs_dim` elements.
#[derive(Debug, Clone)]
pub struct TransitionBatch {
    /// Observations.
    pub obs: Vec<f32>,

    /// Actions.
    pub act: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Terminal flags as `0.0` or `1.0`.
    pub is_terminated: Vec<f32>,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Indices of the sampled transitions in the buffer.
    pub ix_sample: Vec<usize>,
}

impl TransitionBatch {
    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
