//! Train [`Agent`].
mod config;
mod sampler;
mod warmup;
use crate::{
    error::DdpgError,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    replay_buffer::EpisodeBatch,
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, Session, UniformRandomPolicy,
};
use anyhow::{Context, Result};
pub use config::TrainerConfig;
use log::{info, trace, warn};
pub use sampler::Sampler;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};
pub use warmup::WarmupPolicy;

/// Counters of the training loop, persisted in snapshots.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrainerState {
    /// The next epoch to run.
    pub epoch: usize,

    /// The number of sampling cycles done.
    pub itr: usize,

    /// The number of environment steps taken.
    pub env_steps: usize,

    /// The number of optimization steps done.
    pub opt_steps: usize,

    /// Average return of the latest evaluation.
    pub last_return: Option<f32>,

    /// The highest average return of all evaluations, the one of the agent
    /// saved in `(model_dir)/best`.
    #[serde(default)]
    pub best_return: Option<f32>,
}

#[derive(Deserialize, Serialize)]
struct TrainerSnapshot {
    config: TrainerConfig,
    state: TrainerState,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop of an off-policy agent.
///
/// # Training loop
///
/// [`Trainer::train()`] runs `n_epochs * steps_per_epoch` sampling cycles.
/// In every cycle:
///
/// 1. Collect `episodes_per_cycle` complete episodes with [`Sampler`]. Actions
///    at environment steps below `start_steps` come from a
///    [`UniformRandomPolicy`], later ones from the agent in training mode,
///    see [`WarmupPolicy`].
/// 2. Push the episodes into the replay buffer.
/// 3. If the buffer holds at least [`Agent::min_buffer_size`] transitions,
///    perform `n_train_steps` optimization steps.
/// 4. In the first cycle of an epoch, if the buffer is warm, evaluate the
///    agent in evaluation mode with the [`Evaluator`] over
///    `num_evaluation_episodes` episodes discounted by `discount`, and store
///    the result. An agent improving on the best return so far is saved in
///    `(model_dir)/best`.
///
/// At the end of each epoch, statistics returned by [`Agent::epoch_record`]
/// are stored together with the counters of the loop, and the recorder is
/// flushed. If `snapshot_interval > 0`, a snapshot is saved in
/// `(model_dir)/(epoch)` every `snapshot_interval` epochs.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[Sampler]
///     C -->|EpisodeBatch|D[ReplayBufferBase]
///     D -->|TransitionBatch|A
/// ```
pub struct Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = EpisodeBatch> + ReplayBufferBase,
{
    config: TrainerConfig,

    /// Configuration of the environment for training and evaluation.
    env_config: E::Config,

    buffer_config: R::Config,
    buffer: R,
    state: TrainerState,
}

impl<E, R> Trainer<E, R>
where
    E: Env,
    R: ExperienceBufferBase<Item = EpisodeBatch> + ReplayBufferBase,
{
    /// Constructs a trainer with an empty replay buffer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        replay_buffer_config: R::Config,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            env_config,
            buffer: R::build(&replay_buffer_config),
            buffer_config: replay_buffer_config,
            state: TrainerState::default(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Returns the counters of the training loop.
    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    /// Returns the replay buffer.
    pub fn buffer(&self) -> &R {
        &self.buffer
    }

    /// Returns the replay buffer as mutable reference.
    pub fn buffer_mut(&mut self) -> &mut R {
        &mut self.buffer
    }

    /// Train the agent.
    ///
    /// Returns the average return of the last evaluation, or `NaN` if the
    /// replay buffer never reached [`Agent::min_buffer_size`]. Training
    /// resumes from the counters of a loaded snapshot, if any.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<f32>
    where
        A: Agent<E, R>,
        D: Evaluator<E>,
    {
        let _session = match &self.config.model_dir {
            Some(dir) => Some(Session::open(dir)?),
            None => None,
        };
        let env = E::build(&self.env_config, self.config.seed)?;
        env.spec().validate()?;
        let mut random = UniformRandomPolicy::new(
            &env.spec(),
            (self.config.seed as u64).wrapping_add(self.state.env_steps as u64),
        );
        let mut sampler = Sampler::new(env);
        agent.train();

        while self.state.epoch < self.config.n_epochs {
            let epoch = self.state.epoch;

            for cycle in 0..self.config.steps_per_epoch {
                self.cycle(agent, &mut sampler, &mut random)?;

                if cycle == 0 && self.buffer.len() >= agent.min_buffer_size() {
                    let eval_return = self.evaluate(agent, recorder, evaluator)?;
                    if self.state.best_return.map_or(true, |best| eval_return > best) {
                        self.state.best_return = Some(eval_return);
                        if let Some(model_dir) = &self.config.model_dir {
                            let path = Path::new(model_dir).join("best");
                            Self::save_agent(agent, &path);
                        }
                    }
                }

                self.state.itr += 1;
            }

            let mut record = agent.epoch_record(epoch);
            record.insert("TotalEnvSteps", Scalar(self.state.env_steps as _));
            record.insert("Iteration", Scalar(self.state.itr as _));
            record.insert("BufferSize", Scalar(self.buffer.len() as _));
            recorder.store(record);
            recorder.flush(epoch as _);
            info!(
                "Epoch {} finished: {} env steps, {} optimization steps",
                epoch, self.state.env_steps, self.state.opt_steps
            );

            self.state.epoch += 1;
            let interval = self.config.snapshot_interval;
            if interval > 0 && self.state.epoch % interval == 0 {
                if let Some(model_dir) = &self.config.model_dir {
                    let path = Path::new(model_dir).join(format!("{}", self.state.epoch));
                    self.save_snapshot(&path, agent)?;
                }
            }
        }

        Ok(self.state.last_return.unwrap_or(f32::NAN))
    }

    /// Performs a sampling cycle and the optimization steps following it.
    fn cycle<A: Agent<E, R>>(
        &mut self,
        agent: &mut A,
        sampler: &mut Sampler<E>,
        random: &mut UniformRandomPolicy,
    ) -> Result<()> {
        let batch = {
            let mut policy: WarmupPolicy<E, A> = WarmupPolicy::new(
                random,
                &mut *agent,
                self.config.start_steps,
                self.state.env_steps,
            );
            let batch = sampler.collect_episodes(
                self.state.itr,
                &mut policy,
                self.config.episodes_per_cycle,
            )?;
            self.state.env_steps = policy.env_steps();
            batch
        };
        self.buffer.push(batch)?;

        if self.buffer.len() < agent.min_buffer_size() {
            trace!(
                "Replay buffer is warming up: {}/{}",
                self.buffer.len(),
                agent.min_buffer_size()
            );
            return Ok(());
        }

        for _ in 0..self.config.n_train_steps {
            if agent.opt(&mut self.buffer)? {
                self.state.opt_steps += 1;
            }
        }
        Ok(())
    }

    fn evaluate<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<f32>
    where
        A: Agent<E, R>,
        D: Evaluator<E>,
    {
        info!("Starts evaluation of the trained model");
        agent.eval();
        let result = evaluator.evaluate(
            agent,
            self.config.num_evaluation_episodes,
            self.config.discount,
        );
        agent.train();

        let mut record: Record = result?;
        let eval_return = record.get_scalar("Evaluation/AverageReturn")?;
        record.insert("Evaluation/Iteration", Scalar(self.state.itr as _));
        recorder.store(record);
        self.state.last_return = Some(eval_return);
        Ok(eval_return)
    }

    fn save_agent<A: Agent<E, R>>(agent: &A, path: &Path) {
        match agent.save_params(path) {
            Ok(()) => info!("Saved the model in {:?}", path),
            Err(e) => warn!("Failed to save model in {:?}: {}", path, e),
        }
    }

    /// Saves the counters, the replay buffer and the agent in `path`.
    pub fn save_snapshot<A: Agent<E, R>>(&self, path: impl AsRef<Path>, agent: &A) -> Result<()> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;

        let snapshot = TrainerSnapshot {
            config: self.config.clone(),
            state: self.state.clone(),
        };
        let mut file = File::create(path.join("trainer.yaml"))?;
        file.write_all(serde_yaml::to_string(&snapshot)?.as_bytes())?;
        self.buffer.save(&path.join("replay_buffer.bin"))?;
        agent.save_params(&path.join("agent"))?;

        info!("Saved snapshot in {:?}", path);
        Ok(())
    }

    /// Restores a snapshot saved with [`Trainer::save_snapshot`].
    ///
    /// Counters and replay buffer contents are replaced; the configuration of
    /// `self` is kept. On error, the trainer is left as it was. The agent is
    /// left as it was too if its [`Agent::load_params`] fails without side
    /// effects.
    pub fn load_snapshot<A: Agent<E, R>>(
        &mut self,
        path: impl AsRef<Path>,
        agent: &mut A,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path.join("trainer.yaml"))
            .with_context(|| format!("No trainer snapshot in {:?}", path))?;
        let snapshot: TrainerSnapshot = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|e| DdpgError::Serialization(format!("trainer.yaml: {}", e)))?;
        if snapshot.config != self.config {
            warn!("Trainer configuration differs from the one in the snapshot");
        }

        let mut buffer = R::build(&self.buffer_config);
        buffer.load(&path.join("replay_buffer.bin"))?;
        agent.load_params(&path.join("agent"))?;
        self.buffer = buffer;
        self.state = snapshot.state;

        info!("Loaded snapshot from {:?}", path);
        Ok(())
    }
}
