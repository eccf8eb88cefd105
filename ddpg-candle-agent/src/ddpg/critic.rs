//! Critic of DDPG agent.
use crate::{
    model::{ParameterizedFunction, SubModel2},
    opt::{GradientOptimizer, Optimizer, OptimizerConfig},
    util::{hard_update, weights},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, Var, D};
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
/// Configuration of [`Critic`].
pub struct CriticConfig<Q> {
    q_config: Option<Q>,
    opt_config: OptimizerConfig,
}

impl<Q> Default for CriticConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-3 },
        }
    }
}

impl<Q> CriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Returns the configuration of the action-value function, if set.
    pub fn get_q_config(&self) -> Option<&Q> {
        self.q_config.as_ref()
    }

    /// Constructs [CriticConfig] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [CriticConfig].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Represents the critic of DDPG agents.
///
/// It takes observations and actions as inputs and outputs action values.
pub struct Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    name: String,
    device: Device,
    varmap: VarMap,

    /// Action-value function
    q: Q,
    q_config: Q::Config,

    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<Q> Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`Critic`].
    pub fn build(name: &str, config: CriticConfig<Q::Config>, device: Device) -> Result<Critic<Q>> {
        let q_config = config.q_config.context("q_config is not set.")?;
        Self::_build(name, device, q_config, config.opt_config)
    }

    fn _build(
        name: &str,
        device: Device,
        q_config: Q::Config,
        opt_config: OptimizerConfig,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, q_config.clone())?
        };
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self {
            name: name.to_string(),
            device,
            varmap,
            q,
            q_config,
            opt_config,
            opt,
        })
    }

    /// Outputs the action values of shape `(batch_size,)` given observations
    /// and actions.
    pub fn forward(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Ok(self.q.forward(obs, act)?.squeeze(D::Minus1)?)
    }

    /// Takes a gradient step on the parameters of this critic.
    pub fn minimize(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.minimize(loss)
    }

    /// Returns the configuration of the action-value function.
    pub fn q_config(&self) -> &Q::Config {
        &self.q_config
    }

    /// Returns the variables of the critic.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save {} to {:?}", self.name, path.as_ref());
        Ok(())
    }

    /// Loads the parameters saved with [`Critic::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path).map_err(|e| {
            DdpgError::Serialization(format!("{}: {}", path.as_ref().display(), e))
        })?;
        info!("Load {} from {:?}", self.name, path.as_ref());
        Ok(())
    }
}

impl<Q> ParameterizedFunction for Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn clone_as(&self, name: &str) -> Result<Self> {
        let critic = Self::_build(
            name,
            self.device.clone(),
            self.q_config.clone(),
            self.opt_config.clone(),
        )?;
        hard_update(&critic.varmap, &self.varmap)?;
        Ok(critic)
    }

    fn trainable_parameters(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    fn regularizable_parameters(&self) -> Result<Vec<Var>> {
        weights(&self.varmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp, MlpConfig};

    fn critic() -> Result<Critic<Mlp>> {
        let config = CriticConfig::default().q_config(MlpConfig::new(3, vec![4], 1, false));
        Critic::build("critic", config, Device::Cpu)
    }

    fn values(varmap: &VarMap) -> Result<Vec<(String, Vec<f32>)>> {
        let data = varmap.data().lock().unwrap();
        let mut vs = vec![];
        for (k, v) in data.iter() {
            vs.push((k.clone(), v.as_tensor().flatten_all()?.to_vec1()?));
        }
        vs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(vs)
    }

    #[test]
    fn test_clone_as_is_exact_and_independent() -> Result<()> {
        let mut critic = critic()?;
        let target = critic.clone_as("critic_tgt")?;
        assert_eq!(target.name(), "critic_tgt");
        assert_eq!(values(critic.varmap())?, values(target.varmap())?);

        // A gradient step on the online critic leaves the copy untouched
        let before = values(target.varmap())?;
        let obs = Tensor::ones((4, 2), DType::F32, &Device::Cpu)?;
        let act = Tensor::ones((4, 1), DType::F32, &Device::Cpu)?;
        let loss = critic.forward(&obs, &act)?.sqr()?.mean_all()?;
        critic.minimize(&loss)?;
        assert_ne!(values(critic.varmap())?, before);
        assert_eq!(values(target.varmap())?, before);
        Ok(())
    }

    #[test]
    fn test_regularizable_parameters_are_weights() -> Result<()> {
        let critic = critic()?;
        assert_eq!(critic.trainable_parameters().len(), 4);
        let weights = critic.regularizable_parameters()?;
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].dims(), [4, 3]);
        assert_eq!(weights[1].dims(), [1, 4]);

        let expected = crate::util::sum_of_squares(&weights)?.to_scalar::<f32>()? * 0.5;
        let penalty = critic.l2_penalty(0.5)?.unwrap().to_scalar::<f32>()?;
        assert!((penalty - expected).abs() < 1e-5);
        assert!(critic.l2_penalty(0.0)?.is_none());
        Ok(())
    }
}
