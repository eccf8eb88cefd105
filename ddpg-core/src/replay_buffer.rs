//! Replay buffer of fixed-dimension transitions.
mod base;
mod batch;
mod config;
pub use base::TransitionBuffer;
pub use batch::{EpisodeBatch, Transition, TransitionBatch};
pub use config::TransitionBufferConfig;
