//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// In training mode, [`Policy::sample`] is expected to return exploratory
/// actions; in evaluation mode it returns deterministic ones.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// The number of stored transitions required before any optimization
    /// or evaluation takes place.
    fn min_buffer_size(&self) -> usize;

    /// Performs an optimization step and returns some information.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters. Returns `Ok(None)` without touching
    /// any parameter when the buffer holds fewer than
    /// [`min_buffer_size`](Agent::min_buffer_size) transitions.
    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Option<Record>>;

    /// Performs an optimization step, discarding the returned record.
    fn opt(&mut self, buffer: &mut R) -> Result<bool> {
        Ok(self.opt_with_record(buffer)?.is_some())
    }

    /// Returns statistics accumulated since the previous call and resets them.
    fn epoch_record(&mut self, epoch: usize) -> Record;

    /// Save the parameters of the agent in the given directory.
    /// This method commonly creates a number of files consisting the agent
    /// in the directory, for example, the online and target networks.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
