//! Actor of DDPG agent.
use crate::{
    model::{ParameterizedFunction, SubModel1},
    opt::{GradientOptimizer, Optimizer, OptimizerConfig},
    util::{hard_update, weights},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use ddpg_core::error::DdpgError;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`].
pub struct ActorConfig<P> {
    pi_config: Option<P>,
    opt_config: OptimizerConfig,
}

impl<P> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-4 },
        }
    }
}

impl<P> ActorConfig<P>
where
    P: DeserializeOwned + Serialize,
{
    /// Sets configurations for the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Returns the configuration of the policy network, if set.
    pub fn get_pi_config(&self) -> Option<&P> {
        self.pi_config.as_ref()
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Deterministic policy for DDPG agents.
///
/// The output of the network passes through `tanh` and is scaled by
/// `max_action`.
pub struct Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
{
    name: String,
    device: Device,
    varmap: VarMap,
    max_action: f64,

    // Policy network
    pi_config: P::Config,
    pi: P,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`Actor`].
    pub fn build(
        name: &str,
        config: ActorConfig<P::Config>,
        max_action: f32,
        device: Device,
    ) -> Result<Actor<P>> {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        Self::_build(name, device, max_action as f64, pi_config, config.opt_config)
    }

    fn _build(
        name: &str,
        device: Device,
        max_action: f64,
        pi_config: P::Config,
        opt_config: OptimizerConfig,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            P::build(vb, pi_config.clone())?
        };
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self {
            name: name.to_string(),
            device,
            varmap,
            max_action,
            pi_config,
            pi,
            opt_config,
            opt,
        })
    }

    /// Returns actions for a batch of observations.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        Ok((self.pi.forward(obs)?.tanh()? * self.max_action)?)
    }

    /// Takes a gradient step on the parameters of this actor.
    pub fn minimize(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.minimize(loss)
    }

    /// Returns the configuration of the policy network.
    pub fn pi_config(&self) -> &P::Config {
        &self.pi_config
    }

    /// Returns the variables of the actor.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save {} to {:?}", self.name, path.as_ref());
        Ok(())
    }

    /// Loads the parameters saved with [`Actor::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path).map_err(|e| {
            DdpgError::Serialization(format!("{}: {}", path.as_ref().display(), e))
        })?;
        info!("Load {} from {:?}", self.name, path.as_ref());
        Ok(())
    }
}

impl<P> ParameterizedFunction for Actor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn clone_as(&self, name: &str) -> Result<Self> {
        let actor = Self::_build(
            name,
            self.device.clone(),
            self.max_action,
            self.pi_config.clone(),
            self.opt_config.clone(),
        )?;
        hard_update(&actor.varmap, &self.varmap)?;
        Ok(actor)
    }

    fn trainable_parameters(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    fn regularizable_parameters(&self) -> Result<Vec<Var>> {
        weights(&self.varmap)
    }
}
