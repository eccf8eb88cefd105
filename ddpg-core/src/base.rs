//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use env::{Env, EnvSpec};
pub use policy::{Policy, UniformRandomPolicy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Observations are flat vectors of `f32` with a dimension fixed by the
/// [`EnvSpec`] of the environment.
pub trait Obs: Clone + Debug {
    /// Returns the number of elements in the observation.
    fn len(&self) -> usize;

    /// Returns the elements of the observation.
    fn as_slice(&self) -> &[f32];
}

/// An action of an environment.
///
/// Policies create actions from raw vectors, hence the `From<Vec<f32>>` bound.
pub trait Act: Clone + Debug + From<Vec<f32>> {
    /// Returns the number of elements in the action.
    fn len(&self) -> usize;

    /// Returns the elements of the action.
    fn as_slice(&self) -> &[f32];
}
