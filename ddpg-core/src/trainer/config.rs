//! Configuration of [`Trainer`](super::Trainer).
use crate::error::DdpgError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of epochs.
    pub n_epochs: usize,

    /// The number of sampling cycles in an epoch.
    pub steps_per_epoch: usize,

    /// The number of optimization steps per sampling cycle.
    pub n_train_steps: usize,

    /// Actions are sampled uniformly at random in the first `start_steps`
    /// environment steps.
    pub start_steps: usize,

    /// The number of episodes collected in a sampling cycle.
    pub episodes_per_cycle: usize,

    /// The number of episodes of an evaluation.
    pub num_evaluation_episodes: usize,

    /// Discount factor of evaluation returns.
    pub discount: f32,

    /// Seed of the training environment, the evaluation environment and the
    /// warm-up policy.
    pub seed: i64,

    /// Directory of the training session and snapshots.
    pub model_dir: Option<String>,

    /// Interval of saving snapshots in epochs. `0` disables snapshots.
    pub snapshot_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_epochs: 1,
            steps_per_epoch: 20,
            n_train_steps: 50,
            start_steps: 1000,
            episodes_per_cycle: 1,
            num_evaluation_episodes: 10,
            discount: 0.99,
            seed: 42,
            model_dir: None,
            snapshot_interval: 0,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of epochs.
    pub fn n_epochs(mut self, v: usize) -> Self {
        self.n_epochs = v;
        self
    }

    /// Sets the number of sampling cycles in an epoch.
    pub fn steps_per_epoch(mut self, v: usize) -> Self {
        self.steps_per_epoch = v;
        self
    }

    /// Sets the number of optimization steps per sampling cycle.
    pub fn n_train_steps(mut self, v: usize) -> Self {
        self.n_train_steps = v;
        self
    }

    /// Sets the length of the warm-up period in environment steps.
    pub fn start_steps(mut self, v: usize) -> Self {
        self.start_steps = v;
        self
    }

    /// Sets the number of episodes collected in a sampling cycle.
    pub fn episodes_per_cycle(mut self, v: usize) -> Self {
        self.episodes_per_cycle = v;
        self
    }

    /// Sets the number of episodes of an evaluation.
    pub fn num_evaluation_episodes(mut self, v: usize) -> Self {
        self.num_evaluation_episodes = v;
        self
    }

    /// Sets the discount factor of evaluation returns.
    pub fn discount(mut self, v: f32) -> Self {
        self.discount = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory of the training session and snapshots.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the interval of saving snapshots in epochs.
    pub fn snapshot_interval(mut self, v: usize) -> Self {
        self.snapshot_interval = v;
        self
    }

    /// Checks the consistency of the values.
    pub fn validate(&self) -> Result<(), DdpgError> {
        if self.steps_per_epoch == 0 {
            return Err(DdpgError::Configuration(
                "steps_per_epoch must be positive".into(),
            ));
        }
        if self.episodes_per_cycle == 0 {
            return Err(DdpgError::Configuration(
                "episodes_per_cycle must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(DdpgError::Configuration(format!(
                "discount must be in [0, 1], got {}",
                self.discount
            )));
        }
        if self.snapshot_interval > 0 && self.model_dir.is_none() {
            return Err(DdpgError::Configuration(
                "snapshot_interval requires model_dir".into(),
            ));
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .n_epochs(100)
            .start_steps(500)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(TrainerConfig::default().validate().is_ok());
        assert!(TrainerConfig::default()
            .steps_per_epoch(0)
            .validate()
            .is_err());
        assert!(TrainerConfig::default().discount(1.5).validate().is_err());
        assert!(TrainerConfig::default()
            .snapshot_interval(5)
            .validate()
            .is_err());
    }
}
