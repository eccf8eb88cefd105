use anyhow::Result;
use clap::Parser;
use ddpg_candle_agent::{
    ddpg::{ActorConfig, CriticConfig, Ddpg, DdpgConfig},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    Device,
};
use ddpg_core::{
    record::LogRecorder,
    replay_buffer::{TransitionBuffer, TransitionBufferConfig},
    testing::{PointEnv, PointEnvConfig},
    DefaultEvaluator, Env as _, Trainer, TrainerConfig,
};

type Env = PointEnv;
type ReplayBuffer = TransitionBuffer;
type Evaluator = DefaultEvaluator<Env>;

const DIM: usize = 2;
const LR_ACTOR: f64 = 1e-4;
const LR_CRITIC: f64 = 1e-3;
const BATCH_SIZE: usize = 64;
const MIN_BUFFER_SIZE: usize = 1000;
const REPLAY_BUFFER_CAPACITY: usize = 100_000;

/// Train DDPG agent in the point environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The number of epochs
    #[arg(short, long, default_value_t = 10)]
    n_epochs: usize,

    /// YAML file of the trainer configuration
    #[arg(long)]
    trainer_config: Option<String>,

    /// YAML file of the agent configuration
    #[arg(long)]
    agent_config: Option<String>,

    /// Directory of the session and snapshots
    #[arg(short, long)]
    model_dir: Option<String>,

    /// Resume training from a snapshot
    #[arg(short, long)]
    resume: Option<String>,
}

fn create_agent_config() -> DdpgConfig<MlpConfig, MlpConfig> {
    let actor_config = ActorConfig::default()
        .opt_config(OptimizerConfig::default().learning_rate(LR_ACTOR))
        .pi_config(MlpConfig::new(DIM, vec![64, 64], DIM, false));
    let critic_config = CriticConfig::default()
        .opt_config(OptimizerConfig::default().learning_rate(LR_CRITIC))
        .q_config(MlpConfig::new(2 * DIM, vec![64, 64], 1, false));
    DdpgConfig::default()
        .actor_config(actor_config)
        .critic_config(critic_config)
        .batch_size(BATCH_SIZE)
        .min_buffer_size(MIN_BUFFER_SIZE)
        .device(Device::Cpu)
}

fn create_trainer_config(args: &Args) -> Result<TrainerConfig> {
    let config = match &args.trainer_config {
        Some(path) => TrainerConfig::load(path)?,
        None => TrainerConfig::default().start_steps(MIN_BUFFER_SIZE),
    };
    let config = config.n_epochs(args.n_epochs);
    Ok(match &args.model_dir {
        Some(model_dir) => config.model_dir(model_dir.as_str()).snapshot_interval(5),
        None => config,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let env_config = PointEnvConfig::default().dim(DIM);
    let spec = Env::build(&env_config, 0)?.spec();
    let agent_config = match &args.agent_config {
        Some(path) => DdpgConfig::load(path)?,
        None => create_agent_config(),
    };
    let trainer_config = create_trainer_config(&args)?;
    let buffer_config = TransitionBufferConfig::default()
        .capacity(REPLAY_BUFFER_CAPACITY)
        .env_spec(&spec);

    let mut agent: Ddpg<Env, Mlp, Mlp, ReplayBuffer> = Ddpg::build(agent_config, &spec)?;
    let mut evaluator = Evaluator::new(&env_config, trainer_config.seed + 1)?;
    let mut trainer = Trainer::<Env, ReplayBuffer>::build(trainer_config, env_config, buffer_config)?;
    if let Some(path) = &args.resume {
        trainer.load_snapshot(path, &mut agent)?;
    }

    let mut recorder = LogRecorder::new();
    let ret = trainer.train(&mut agent, &mut recorder, &mut evaluator)?;
    log::info!("Average return of the last evaluation: {}", ret);

    Ok(())
}
