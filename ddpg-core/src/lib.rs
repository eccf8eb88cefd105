#![warn(missing_docs)]
//! Core components of a DDPG training pipeline.
//!
//! This crate is independent of any tensor backend. It defines the interfaces
//! between environments, policies and agents, and provides the pieces that
//! drive off-policy training around them:
//!
//! * [`TransitionBuffer`](replay_buffer::TransitionBuffer), a replay buffer of
//!   fixed-dimension transitions.
//! * [`Sampler`], which collects complete episodes with an acting policy.
//! * [`Trainer`], which interleaves warm-up, sampling, optimization and
//!   evaluation.
//! * [`record`], the types used for logging metrics.
pub mod error;
pub mod record;
pub mod replay_buffer;
pub mod testing;

mod base;
pub use base::{
    Act, Agent, Env, EnvSpec, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase, Step,
    UniformRandomPolicy,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod session;
pub use session::Session;

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig, TrainerState, WarmupPolicy};
