//! Deep deterministic policy gradient (DDPG) agent.
mod actor;
mod base;
mod config;
mod critic;
mod explorer;
mod state;
pub use actor::{Actor, ActorConfig};
pub use base::{compute_target, Ddpg};
pub use config::DdpgConfig;
pub use critic::{Critic, CriticConfig};
pub use explorer::ExplorationNoise;
pub use state::{AlgorithmState, OptStats};
