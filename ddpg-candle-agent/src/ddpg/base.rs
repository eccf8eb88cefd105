//! DDPG agent.
use super::{
    explorer::{gaussian, Explorer},
    Actor, AlgorithmState, Critic, DdpgConfig, OptStats,
};
use crate::{
    model::{ParameterizedFunction, SubModel1, SubModel2},
    util::track,
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use ddpg_core::{
    error::{check_finite, DdpgError},
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    Agent, Env, EnvSpec, ExperienceBufferBase, Obs, Policy, ReplayBufferBase,
};
use log::{info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    convert::TryFrom,
    fmt::Debug,
    fs::{self, File},
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};

/// Computes regression targets of the critic.
///
/// `y = reward_scale * reward + (1 - is_terminated) * discount * target_q`,
/// clipped to `range`. Clipping is skipped if both ends of `range` are
/// infinite.
pub fn compute_target(
    reward: &Tensor,
    is_terminated: &Tensor,
    target_q: &Tensor,
    reward_scale: f64,
    discount: f64,
    range: (f32, f32),
) -> Result<Tensor> {
    let reward = (reward * reward_scale)?;
    let not_done = (1f64 - is_terminated)?;
    let y = (reward + ((not_done * discount)? * target_q)?)?;

    match range.0.is_finite() || range.1.is_finite() {
        true => Ok(y.clamp(range.0, range.1)?),
        false => Ok(y),
    }
}

fn add_penalty(loss: Tensor, penalty: Option<Tensor>) -> Result<Tensor> {
    match penalty {
        Some(penalty) => Ok((loss + penalty)?),
        None => Ok(loss),
    }
}

fn finite_values(name: &str, t: &Tensor) -> Result<Vec<f32>> {
    let values: Vec<f32> = t.to_vec1()?;
    for &v in values.iter() {
        check_finite(name, v)?;
    }
    Ok(values)
}

/// Deep deterministic policy gradient (DDPG) agent.
///
/// Holds an actor and a critic together with their target copies. Each
/// optimization step updates the critic first and then the actor, using the
/// updated critic, before both targets are moved towards the online
/// networks by `tau`.
pub struct Ddpg<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch> + ExperienceBufferBase,
{
    config: DdpgConfig<Q::Config, P::Config>,
    actor: Actor<P>,
    actor_tgt: Actor<P>,
    critic: Critic<Q>,
    critic_tgt: Critic<Q>,
    explorer: Explorer,
    state: AlgorithmState,
    spec: EnvSpec,
    train: bool,
    device: Device,
    phantom: PhantomData<(E, R)>,
}

impl<E, Q, P, R> Ddpg<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch> + ExperienceBufferBase,
{
    /// Constructs [`Ddpg`] agent for an environment with the given
    /// specification.
    ///
    /// Target networks start as exact copies of the online networks.
    pub fn build(config: DdpgConfig<Q::Config, P::Config>, spec: &EnvSpec) -> Result<Self> {
        config.validate()?;
        spec.validate()?;
        let device = Device::try_from(config.device.unwrap_or_default())?;
        let actor = Actor::build(
            "actor",
            config.actor_config.clone(),
            spec.max_action,
            device.clone(),
        )?;
        let actor_tgt = actor.clone_as("actor_tgt")?;
        let critic = Critic::build("critic", config.critic_config.clone(), device.clone())?;
        let critic_tgt = critic.clone_as("critic_tgt")?;
        info!("Built DDPG agent for {:?}", spec);

        Ok(Self {
            explorer: Explorer::new(config.exploration.clone()),
            config,
            actor,
            actor_tgt,
            critic,
            critic_tgt,
            state: AlgorithmState::default(),
            spec: *spec,
            train: false,
            device,
            phantom: PhantomData,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DdpgConfig<Q::Config, P::Config> {
        &self.config
    }

    /// Returns the counters and rolling statistics.
    pub fn state(&self) -> &AlgorithmState {
        &self.state
    }

    /// Returns the online actor.
    pub fn actor(&self) -> &Actor<P> {
        &self.actor
    }

    /// Returns the target actor.
    pub fn actor_tgt(&self) -> &Actor<P> {
        &self.actor_tgt
    }

    /// Returns the online critic.
    pub fn critic(&self) -> &Critic<Q> {
        &self.critic
    }

    /// Returns the target critic.
    pub fn critic_tgt(&self) -> &Critic<Q> {
        &self.critic_tgt
    }

    fn check_dim(&self, field: &'static str, expected: usize, got: usize) -> Result<()> {
        match expected == got {
            true => Ok(()),
            false => Err(DdpgError::ShapeMismatch {
                field,
                expected,
                got,
            }
            .into()),
        }
    }

    fn rows(&self, xs: &[f32], dim: usize) -> Result<Tensor> {
        Ok(Tensor::from_slice(xs, (xs.len() / dim, dim), &self.device)?)
    }

    /// Noise added to target actions, drawn from `N(0, target_noise_sigma)`
    /// and clipped to `[-target_noise_clip, target_noise_clip]`.
    pub fn target_noise(&self, act: &Tensor) -> Result<Tensor> {
        let clip = self.config.target_noise_clip;
        Ok(gaussian(act, self.config.target_noise_sigma)?.clamp(-clip, clip)?)
    }

    fn soft_update(&mut self) -> Result<()> {
        track(self.actor_tgt.varmap(), self.actor.varmap(), self.config.tau)?;
        track(self.critic_tgt.varmap(), self.critic.varmap(), self.config.tau)?;
        Ok(())
    }

    /// Performs an optimization step on a batch of transitions.
    ///
    /// Non-finite losses, action values or regression targets are reported
    /// as [`DdpgError::NumericDivergence`] before the corresponding network
    /// is updated.
    pub fn optimize_policy(&mut self, batch: &TransitionBatch) -> Result<OptStats> {
        self.check_dim("obs", self.spec.obs_dim, batch.obs_dim)?;
        self.check_dim("act", self.spec.act_dim, batch.act_dim)?;
        let n = batch.len();
        let obs = self.rows(&batch.obs, batch.obs_dim)?;
        let act = self.rows(&batch.act, batch.act_dim)?;
        let next_obs = self.rows(&batch.next_obs, batch.obs_dim)?;
        let reward = Tensor::from_slice(&batch.reward, (n,), &self.device)?;
        let is_terminated = Tensor::from_slice(&batch.is_terminated, (n,), &self.device)?;

        trace!("compute_target()");
        let y = {
            let next_act = self.actor_tgt.forward(&next_obs)?;
            let next_act = (&next_act + self.target_noise(&next_act)?)?;
            let target_q = self.critic_tgt.forward(&next_obs, &next_act)?;
            compute_target(
                &reward,
                &is_terminated,
                &target_q,
                self.config.reward_scale as f64,
                self.config.discount,
                self.config.target_range(),
            )?
        }
        .detach();

        trace!("update_critic()");
        let q = self.critic.forward(&obs, &act)?;
        let qf_loss = add_penalty(
            mse(&q, &y)?,
            self.critic.l2_penalty(self.config.qf_weight_decay)?,
        )?;
        let y_values = finite_values("y", &y)?;
        let q_values = finite_values("q", &q)?;
        let qf_loss_value = check_finite("qf_loss", qf_loss.to_scalar::<f32>()?)?;
        self.critic.minimize(&qf_loss)?;
        self.state.n_qf_updates += 1;

        trace!("update_actor()");
        let policy_loss = {
            let act = self.actor.forward(&obs)?;
            let loss = self.critic.forward(&obs, &act)?.mean_all()?.neg()?;
            add_penalty(loss, self.actor.l2_penalty(self.config.policy_weight_decay)?)?
        };
        let policy_loss_value = check_finite("policy_loss", policy_loss.to_scalar::<f32>()?)?;
        self.actor.minimize(&policy_loss)?;
        self.state.n_policy_updates += 1;

        trace!("soft_update()");
        self.soft_update()?;
        self.state.n_opts += 1;

        let stats = OptStats {
            qf_loss: qf_loss_value,
            y: y_values,
            q: q_values,
            policy_loss: policy_loss_value,
        };
        self.state.push(stats.clone());
        Ok(stats)
    }
}

impl<E, Q, P, R> Policy<E> for Ddpg<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch> + ExperienceBufferBase,
{
    /// Returns the action of the actor, perturbed by exploration noise in
    /// training mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        self.check_dim("obs", self.spec.obs_dim, obs.len())?;
        let obs = Tensor::from_slice(obs.as_slice(), (1, obs.len()), &self.device)?;
        let act = self.actor.forward(&obs)?;
        let act = match self.train {
            true => self
                .explorer
                .perturb(&act, self.spec.max_action as f64)?,
            false => act,
        };
        let act: Vec<f32> = act.squeeze(0)?.to_vec1()?;
        Ok(act.into())
    }

    fn reset(&mut self) {
        self.explorer.reset();
    }
}

impl<E, Q, P, R> Agent<E, R> for Ddpg<E, Q, P, R>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch> + ExperienceBufferBase,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn min_buffer_size(&self) -> usize {
        self.config.min_buffer_size
    }

    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.config.min_buffer_size {
            trace!(
                "Skip optimization: {} < {} transitions",
                buffer.len(),
                self.config.min_buffer_size
            );
            return Ok(None);
        }

        let batch = buffer.batch(self.config.batch_size)?;
        let stats = self.optimize_policy(&batch)?;

        Ok(Some(Record::from_slice(&[
            ("qf_loss", RecordValue::Scalar(stats.qf_loss)),
            ("policy_loss", RecordValue::Scalar(stats.policy_loss)),
        ])))
    }

    fn epoch_record(&mut self, epoch: usize) -> Record {
        self.state.epoch_record(epoch)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.config.save(path.join("ddpg.yaml"))?;
        self.actor.save(path.join("actor.safetensors"))?;
        self.actor_tgt.save(path.join("actor_tgt.safetensors"))?;
        self.critic.save(path.join("critic.safetensors"))?;
        self.critic_tgt.save(path.join("critic_tgt.safetensors"))?;

        let mut file = File::create(path.join("state.yaml"))?;
        file.write_all(serde_yaml::to_string(&self.state)?.as_bytes())?;
        Ok(())
    }

    /// Loads parameters saved with [`Agent::save_params`].
    ///
    /// Nothing is modified unless every file is read successfully. Optimizers
    /// are rebuilt over the loaded parameters, without their moments.
    fn load_params(&mut self, path: &Path) -> Result<()> {
        let serialization = |file: &str, e: &dyn std::fmt::Display| {
            DdpgError::Serialization(format!("{}: {}", path.join(file).display(), e))
        };

        let saved = DdpgConfig::<Q::Config, P::Config>::load(path.join("ddpg.yaml"))
            .map_err(|e| serialization("ddpg.yaml", &e))?;
        if saved.actor_config.get_pi_config() != Some(self.actor.pi_config())
            || saved.critic_config.get_q_config() != Some(self.critic.q_config())
        {
            return Err(serialization("ddpg.yaml", &"network architecture mismatch").into());
        }
        if saved != self.config {
            warn!("Hyperparameters in {:?} differ from the current ones", path);
        }

        let state: AlgorithmState = {
            let file = File::open(path.join("state.yaml"))
                .map_err(|e| serialization("state.yaml", &e))?;
            serde_yaml::from_reader(BufReader::new(file))
                .map_err(|e| serialization("state.yaml", &e))?
        };

        // Fresh copies come with fresh optimizers
        let mut actor = self.actor.clone_as("actor")?;
        let mut actor_tgt = self.actor_tgt.clone_as("actor_tgt")?;
        let mut critic = self.critic.clone_as("critic")?;
        let mut critic_tgt = self.critic_tgt.clone_as("critic_tgt")?;
        actor.load(path.join("actor.safetensors"))?;
        actor_tgt.load(path.join("actor_tgt.safetensors"))?;
        critic.load(path.join("critic.safetensors"))?;
        critic_tgt.load(path.join("critic_tgt.safetensors"))?;

        self.actor = actor;
        self.actor_tgt = actor_tgt;
        self.critic = critic;
        self.critic_tgt = critic_tgt;
        self.state = state;
        self.explorer.reset();
        info!("Loaded DDPG agent from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ddpg::{ActorConfig, CriticConfig},
        mlp::{Mlp, MlpConfig},
    };
    use candle_core::DType;
    use candle_nn::VarMap;
    use ddpg_core::{
        replay_buffer::{EpisodeBatch, Transition, TransitionBuffer, TransitionBufferConfig},
        testing::{PointEnv, PointObs},
    };
    use tempdir::TempDir;

    type TestDdpg = Ddpg<PointEnv, Mlp, Mlp, TransitionBuffer>;
    type TestConfig = DdpgConfig<MlpConfig, MlpConfig>;

    const SPEC: EnvSpec = EnvSpec {
        obs_dim: 2,
        act_dim: 2,
        max_action: 1.0,
    };

    fn config(units: usize) -> TestConfig {
        DdpgConfig::default()
            .actor_config(ActorConfig::default().pi_config(MlpConfig::new(2, vec![units], 2, false)))
            .critic_config(
                CriticConfig::default().q_config(MlpConfig::new(4, vec![units], 1, false)),
            )
            .min_buffer_size(100)
            .batch_size(10)
    }

    fn buffer() -> TransitionBuffer {
        TransitionBuffer::build(
            &TransitionBufferConfig::default()
                .capacity(10000)
                .env_spec(&SPEC),
        )
    }

    /// Deterministic synthetic transitions.
    fn transitions(n: usize, offset: usize, reward: f32) -> EpisodeBatch {
        let transitions = (offset..offset + n)
            .map(|i| {
                let x = (i % 17) as f32 * 0.1 - 0.8;
                Transition {
                    obs: vec![x, -x],
                    act: vec![0.5, -0.5],
                    reward,
                    next_obs: vec![x + 0.05, -x],
                    is_terminated: i % 10 == 9,
                }
            })
            .collect();
        EpisodeBatch {
            transitions,
            episode_returns: vec![],
            episode_lengths: vec![],
        }
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

    fn tensor(xs: &[f32]) -> Result<Tensor> {
        Ok(Tensor::from_slice(xs, (xs.len(),), &Device::Cpu)?)
    }

    #[test]
    fn test_targets_start_as_exact_copies() -> Result<()> {
        let agent = TestDdpg::build(config(8), &SPEC)?;
        assert_eq!(
            values(agent.actor().varmap())?,
            values(agent.actor_tgt().varmap())?
        );
        assert_eq!(
            values(agent.critic().varmap())?,
            values(agent.critic_tgt().varmap())?
        );
        Ok(())
    }

    #[test]
    fn test_build_rejects_invalid_max_action() {
        for max_action in [-1.0, f32::NAN] {
            let spec = EnvSpec { max_action, ..SPEC };
            let err = match TestDdpg::build(config(8), &spec) {
                Ok(_) => panic!("built an agent with max_action = {}", max_action),
                Err(e) => e,
            };
            assert!(matches!(
                err.downcast_ref::<DdpgError>(),
                Some(DdpgError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_soft_update_moves_by_tau() -> Result<()> {
        let tau = 0.3;
        let mut agent = TestDdpg::build(config(8).tau(tau), &SPEC)?;

        // Move the online critic away from its target
        let obs = Tensor::ones((4, 2), DType::F32, &Device::Cpu)?;
        let act = Tensor::ones((4, 2), DType::F32, &Device::Cpu)?;
        let loss = agent.critic.forward(&obs, &act)?.sqr()?.mean_all()?;
        agent.critic.minimize(&loss)?;

        let online = values(agent.critic().varmap())?;
        let before = values(agent.critic_tgt().varmap())?;
        agent.soft_update()?;
        let after = values(agent.critic_tgt().varmap())?;

        let mut n_moved = 0;
        for ((o, b), a) in online.iter().zip(before.iter()).zip(after.iter()) {
            for ((o, b), a) in o.1.iter().zip(b.1.iter()).zip(a.1.iter()) {
                let expected = b + tau as f32 * (o - b);
                assert!((a - expected).abs() < 1e-6);
                if o != b {
                    assert!((o - a).abs() < (o - b).abs());
                    n_moved += 1;
                }
            }
        }
        assert!(n_moved > 0);

        // The actor was not updated, so its target stays in place
        assert_eq!(
            values(agent.actor().varmap())?,
            values(agent.actor_tgt().varmap())?
        );
        Ok(())
    }

    #[test]
    fn test_terminal_target_is_reward() -> Result<()> {
        let reward = tensor(&[1.5, -0.25])?;
        let is_terminated = tensor(&[1.0, 1.0])?;
        let target_q = tensor(&[1e6, -42.0])?;
        let range = (f32::NEG_INFINITY, f32::INFINITY);

        let y = compute_target(&reward, &is_terminated, &target_q, 1.0, 0.99, range)?;
        assert_eq!(y.to_vec1::<f32>()?, vec![1.5, -0.25]);
        Ok(())
    }

    #[test]
    fn test_reward_scaling_commutes() -> Result<()> {
        let scale = 2.5;
        let raw = [1.0f32, -2.0, 0.5];
        let scaled: Vec<f32> = raw.iter().map(|r| r * scale).collect();
        let is_terminated = tensor(&[0.0, 1.0, 0.0])?;
        let target_q = tensor(&[3.0, 4.0, -1.0])?;
        let range = (f32::NEG_INFINITY, f32::INFINITY);

        let y1 = compute_target(&tensor(&raw)?, &is_terminated, &target_q, scale as f64, 0.9, range)?;
        let y2 = compute_target(&tensor(&scaled)?, &is_terminated, &target_q, 1.0, 0.9, range)?;
        for (a, b) in y1.to_vec1::<f32>()?.iter().zip(y2.to_vec1::<f32>()?.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_scaling_and_discount_composition() -> Result<()> {
        // A target action value of 5 in reward units is 10 in scaled units
        let y = compute_target(
            &tensor(&[1.0])?,
            &tensor(&[0.0])?,
            &tensor(&[10.0])?,
            2.0,
            0.99,
            (f32::NEG_INFINITY, f32::INFINITY),
        )?;
        assert!((y.to_vec1::<f32>()?[0] - 11.9).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_target_is_clipped() -> Result<()> {
        let y = compute_target(
            &tensor(&[1.0, -10.0])?,
            &tensor(&[1.0, 1.0])?,
            &tensor(&[0.0, 0.0])?,
            1.0,
            0.99,
            (-5.0, 0.0),
        )?;
        assert_eq!(y.to_vec1::<f32>()?, vec![0.0, -5.0]);
        Ok(())
    }

    #[test]
    fn test_target_noise_is_clipped() -> Result<()> {
        let agent = TestDdpg::build(config(8).target_noise(10.0, 0.5), &SPEC)?;
        let act = Tensor::zeros((64, 2), DType::F32, &Device::Cpu)?;

        for _ in 0..100 {
            let noise = agent.target_noise(&act)?;
            let max = noise.abs()?.flatten_all()?.max(0)?.to_scalar::<f32>()?;
            assert!(max <= 0.5);
        }
        Ok(())
    }

    #[test]
    fn test_no_optimization_below_min_buffer_size() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut agent = TestDdpg::build(config(8), &SPEC)?;
        let mut buffer = buffer();

        buffer.push(transitions(99, 0, 1.0))?;
        assert!(agent.opt_with_record(&mut buffer)?.is_none());
        assert_eq!(agent.state().n_qf_updates, 0);
        assert_eq!(agent.state().n_policy_updates, 0);
        assert_eq!(
            values(agent.critic().varmap())?,
            values(agent.critic_tgt().varmap())?
        );

        buffer.push(transitions(1, 99, 1.0))?;
        let record = agent
            .opt_with_record(&mut buffer)?
            .expect("buffer is warm");
        assert_eq!(agent.state().n_qf_updates, 1);
        assert_eq!(agent.state().n_policy_updates, 1);
        assert_eq!(agent.state().n_opts, 1);
        assert!(record.get_scalar("qf_loss")?.is_finite());
        assert!(record.get_scalar("policy_loss")?.is_finite());

        let epoch = agent.epoch_record(0);
        assert_eq!(epoch.len(), 9);
        assert!(epoch.get_scalar("QFunction/MaxY")?.is_finite());
        Ok(())
    }

    #[test]
    fn test_divergence_is_fatal() -> Result<()> {
        let mut agent = TestDdpg::build(config(8).min_buffer_size(10), &SPEC)?;
        let mut buffer = buffer();
        buffer.push(transitions(10, 0, f32::NAN))?;
        let critic = values(agent.critic().varmap())?;

        let err = agent.opt_with_record(&mut buffer).unwrap_err();
        match err.downcast_ref::<DdpgError>() {
            Some(DdpgError::NumericDivergence { name, .. }) => assert_eq!(name, "y"),
            e => panic!("unexpected error: {:?}", e),
        }
        assert_eq!(agent.state().n_qf_updates, 0);
        assert_eq!(values(agent.critic().varmap())?, critic);
        Ok(())
    }

    #[test]
    fn test_sample() -> Result<()> {
        let mut agent = TestDdpg::build(config(8), &SPEC)?;
        let obs = PointObs(vec![0.3, -0.7]);

        Agent::<PointEnv, TransitionBuffer>::eval(&mut agent);
        let a1 = agent.sample(&obs)?;
        let a2 = agent.sample(&obs)?;
        assert_eq!(a1, a2);
        assert_eq!(a1.0.len(), 2);

        Agent::<PointEnv, TransitionBuffer>::train(&mut agent);
        for _ in 0..10 {
            let a = agent.sample(&obs)?;
            assert!(a.0.iter().all(|v| v.abs() <= 1.0));
        }
        assert!(agent.sample(&PointObs(vec![0.0; 3])).is_err());
        Ok(())
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let tmp_dir = TempDir::new("ddpg")?;
        let path = tmp_dir.path().join("agent");
        let mut buffer = buffer();
        buffer.push(transitions(100, 0, -1.0))?;

        let mut agent = TestDdpg::build(config(8), &SPEC)?;
        for _ in 0..3 {
            agent.opt_with_record(&mut buffer)?;
        }
        agent.save_params(&path)?;
        for file in &[
            "ddpg.yaml",
            "actor.safetensors",
            "actor_tgt.safetensors",
            "critic.safetensors",
            "critic_tgt.safetensors",
            "state.yaml",
        ] {
            assert!(path.join(file).exists(), "{} is missing", file);
        }

        let mut loaded = TestDdpg::build(config(8), &SPEC)?;
        loaded.load_params(&path)?;
        for (a, b) in &[
            (agent.actor().varmap(), loaded.actor().varmap()),
            (agent.actor_tgt().varmap(), loaded.actor_tgt().varmap()),
            (agent.critic().varmap(), loaded.critic().varmap()),
            (agent.critic_tgt().varmap(), loaded.critic_tgt().varmap()),
        ] {
            assert_eq!(values(a)?, values(b)?);
        }
        assert_eq!(loaded.state().n_opts, 3);
        assert_eq!(loaded.state().n_qf_updates, 3);

        // Training resumes with rebuilt optimizers
        assert!(loaded.opt_with_record(&mut buffer)?.is_some());
        assert_eq!(loaded.state().n_opts, 4);
        Ok(())
    }

    #[test]
    fn test_load_params_rejects_other_architecture() -> Result<()> {
        let tmp_dir = TempDir::new("ddpg")?;
        let path = tmp_dir.path().join("agent");
        TestDdpg::build(config(8), &SPEC)?.save_params(&path)?;

        let mut other = TestDdpg::build(config(16), &SPEC)?;
        let before = values(other.actor().varmap())?;
        let err = other.load_params(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DdpgError>(),
            Some(DdpgError::Serialization(_))
        ));
        assert_eq!(values(other.actor().varmap())?, before);

        let err = other.load_params(&tmp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DdpgError>(),
            Some(DdpgError::Serialization(_))
        ));
        Ok(())
    }
}
