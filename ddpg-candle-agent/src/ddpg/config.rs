//! Configuration of DDPG agent.
use super::{ActorConfig, CriticConfig, ExplorationNoise};
use crate::Device;
use anyhow::Result;
use ddpg_core::error::DdpgError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ddpg`](super::Ddpg).
///
/// `Q` and `P` are the configurations of the critic and actor networks.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DdpgConfig<Q, P> {
    /// Configuration of the actor.
    pub actor_config: ActorConfig<P>,

    /// Configuration of the critic.
    pub critic_config: CriticConfig<Q>,

    /// Discount factor.
    pub discount: f64,

    /// Soft update coefficient of target networks.
    pub tau: f64,

    /// Batch size for training.
    pub batch_size: usize,

    /// The number of transitions in the replay buffer required before
    /// optimization starts.
    pub min_buffer_size: usize,

    /// Scale of rewards.
    pub reward_scale: f32,

    /// Standard deviation of the noise added to target actions.
    pub target_noise_sigma: f64,

    /// Bound of the noise added to target actions.
    pub target_noise_clip: f64,

    /// L2 weight decay of the critic.
    pub qf_weight_decay: f64,

    /// L2 weight decay of the actor.
    pub policy_weight_decay: f64,

    /// If `true`, regression targets are clipped to be non-positive.
    pub clip_pos_returns: bool,

    /// Bound of the absolute value of regression targets.
    pub clip_return: f32,

    /// Noise added to actions in training mode.
    pub exploration: ExplorationNoise,

    /// Device for actor/critic models.
    pub device: Option<Device>,
}

impl<Q, P> Default for DdpgConfig<Q, P> {
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            discount: 0.99,
            tau: 0.01,
            batch_size: 64,
            min_buffer_size: 10000,
            reward_scale: 1.0,
            target_noise_sigma: 0.2,
            target_noise_clip: 0.5,
            qf_weight_decay: 0.0,
            policy_weight_decay: 0.0,
            clip_pos_returns: false,
            clip_return: f32::INFINITY,
            exploration: ExplorationNoise::default(),
            device: None,
        }
    }
}

impl<Q, P> DdpgConfig<Q, P>
where
    Q: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
{
    /// Configuration of actor.
    pub fn actor_config(mut self, v: ActorConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Configuration of critic.
    pub fn critic_config(mut self, v: CriticConfig<Q>) -> Self {
        self.critic_config = v;
        self
    }

    /// Discount factor.
    pub fn discount(mut self, v: f64) -> Self {
        self.discount = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Minimum size of the replay buffer for optimization.
    pub fn min_buffer_size(mut self, v: usize) -> Self {
        self.min_buffer_size = v;
        self
    }

    /// Scale of rewards.
    pub fn reward_scale(mut self, v: f32) -> Self {
        self.reward_scale = v;
        self
    }

    /// Standard deviation and bound of the noise on target actions.
    pub fn target_noise(mut self, sigma: f64, clip: f64) -> Self {
        self.target_noise_sigma = sigma;
        self.target_noise_clip = clip;
        self
    }

    /// L2 weight decay of the critic.
    pub fn qf_weight_decay(mut self, v: f64) -> Self {
        self.qf_weight_decay = v;
        self
    }

    /// L2 weight decay of the actor.
    pub fn policy_weight_decay(mut self, v: f64) -> Self {
        self.policy_weight_decay = v;
        self
    }

    /// Clipping of regression targets.
    pub fn clip_return(mut self, clip_return: f32, clip_pos_returns: bool) -> Self {
        self.clip_return = clip_return;
        self.clip_pos_returns = clip_pos_returns;
        self
    }

    /// Exploration noise.
    pub fn exploration(mut self, v: ExplorationNoise) -> Self {
        self.exploration = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Returns the range to which regression targets are clipped.
    pub fn target_range(&self) -> (f32, f32) {
        let hi = match self.clip_pos_returns {
            true => 0.0,
            false => self.clip_return,
        };
        (-self.clip_return, hi)
    }

    /// Checks hyperparameters.
    pub fn validate(&self) -> Result<(), DdpgError> {
        let fail = |msg: String| Err(DdpgError::Configuration(msg));

        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return fail(format!("tau must be in (0, 1], got {}", self.tau));
        }
        if !(self.reward_scale > 0.0) {
            return fail(format!(
                "reward_scale must be positive, got {}",
                self.reward_scale
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return fail(format!("discount must be in [0, 1], got {}", self.discount));
        }
        if self.batch_size == 0 {
            return fail("batch_size must be positive".to_string());
        }
        if self.min_buffer_size < self.batch_size {
            return fail(format!(
                "min_buffer_size ({}) is smaller than batch_size ({})",
                self.min_buffer_size, self.batch_size
            ));
        }
        if self.qf_weight_decay < 0.0 || self.policy_weight_decay < 0.0 {
            return fail("weight decays must be non-negative".to_string());
        }
        if self.target_noise_sigma < 0.0 || self.target_noise_clip < 0.0 {
            return fail("target noise parameters must be non-negative".to_string());
        }
        if !(self.clip_return > 0.0) {
            return fail(format!(
                "clip_return must be positive, got {}",
                self.clip_return
            ));
        }
        if self.actor_config.get_pi_config().is_none() {
            return fail("pi_config of the actor is not set".to_string());
        }
        if self.critic_config.get_q_config().is_none() {
            return fail("q_config of the critic is not set".to_string());
        }
        self.exploration.validate()
    }

    /// Constructs [`DdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        log::info!("Load config of DDPG agent from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`DdpgConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::MlpConfig;
    use tempdir::TempDir;

    type Config = DdpgConfig<MlpConfig, MlpConfig>;

    fn config() -> Config {
        DdpgConfig::default()
            .actor_config(ActorConfig::default().pi_config(MlpConfig::new(2, vec![8], 1, false)))
            .critic_config(CriticConfig::default().q_config(MlpConfig::new(3, vec![8], 1, false)))
    }

    fn is_configuration_error(config: &Config) -> bool {
        matches!(config.validate(), Err(DdpgError::Configuration(_)))
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());
        assert!(is_configuration_error(&config().tau(0.0)));
        assert!(is_configuration_error(&config().tau(1.5)));
        assert!(config().tau(1.0).validate().is_ok());
        assert!(is_configuration_error(&config().reward_scale(0.0)));
        assert!(is_configuration_error(
            &config().min_buffer_size(10).batch_size(64)
        ));
        assert!(is_configuration_error(&config().discount(1.01)));
        assert!(is_configuration_error(&config().qf_weight_decay(-1.0)));
        assert!(is_configuration_error(&config().target_noise(-0.2, 0.5)));
        assert!(is_configuration_error(&DdpgConfig::default()));
    }

    #[test]
    fn test_target_range() {
        assert_eq!(config().target_range(), (f32::NEG_INFINITY, f32::INFINITY));
        assert_eq!(config().clip_return(5.0, true).target_range(), (-5.0, 0.0));
    }

    #[test]
    fn test_serde_ddpg_config() -> Result<()> {
        let config = config()
            .clip_return(f32::INFINITY, false)
            .exploration(ExplorationNoise::OrnsteinUhlenbeck {
                mu: 0.0,
                theta: 0.15,
                sigma: 0.3,
                dt: 1e-2,
            })
            .device(Device::Cpu);

        let dir = TempDir::new("ddpg_config")?;
        let path = dir.path().join("ddpg_config.yaml");
        config.save(&path)?;
        let config_ = Config::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
