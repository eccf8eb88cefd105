//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use itertools::{Itertools, MinMaxResult};
use log::info;

/// Runs evaluation episodes and summarises their returns.
///
/// The `ix`-th episode starts from [`Env::reset_with_index`]`(ix)`, so every
/// evaluation sees the same initial states. The returned record has the keys
///
/// * `Evaluation/NumEpisodes`
/// * `Evaluation/AverageDiscountedReturn`
/// * `Evaluation/AverageReturn`
/// * `Evaluation/StdReturn`
/// * `Evaluation/MaxReturn`
/// * `Evaluation/MinReturn`
/// * `Evaluation/TerminationRate`
///
/// # Examples
///
/// ```ignore
/// let config = EnvConfig::default();
/// let mut evaluator = DefaultEvaluator::new(&config, 42)?;
///
/// let record = evaluator.evaluate(&mut agent, 10, 0.99)?;
/// println!("Average return: {}", record.get_scalar("Evaluation/AverageReturn")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    env: E,
}

/// Returns of one evaluation episode.
struct EpisodeStats {
    ret: f32,
    discounted_ret: f32,
    is_terminated: bool,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration for the environment
    /// * `seed` - Random seed for environment initialization
    pub fn new(config: &E::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            env: E::build(config, seed)?,
        })
    }

    fn run_episode<P: Policy<E>>(
        &mut self,
        policy: &mut P,
        ix: usize,
        discount: f32,
    ) -> Result<EpisodeStats> {
        let mut prev_obs = self.env.reset_with_index(ix)?;
        policy.reset();
        let mut stats = EpisodeStats {
            ret: 0.0,
            discounted_ret: 0.0,
            is_terminated: false,
        };
        let mut gamma_t = 1f32;

        loop {
            let act = policy.sample(&prev_obs)?;
            let (step, _) = self.env.step(&act);
            stats.ret += step.reward;
            stats.discounted_ret += gamma_t * step.reward;
            gamma_t *= discount;
            if step.is_done() {
                stats.is_terminated = step.is_terminated;
                break;
            }
            prev_obs = step.obs;
        }

        Ok(stats)
    }
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(
        &mut self,
        policy: &mut P,
        n_episodes: usize,
        discount: f32,
    ) -> Result<Record> {
        let episodes = (0..n_episodes)
            .map(|ix| self.run_episode(policy, ix, discount))
            .collect::<Result<Vec<_>>>()?;

        let n = episodes.len().max(1) as f32;
        let mean = episodes.iter().map(|e| e.ret).sum::<f32>() / n;
        let mean_discounted = episodes.iter().map(|e| e.discounted_ret).sum::<f32>() / n;
        let std = (episodes
            .iter()
            .map(|e| (e.ret - mean).powi(2))
            .sum::<f32>()
            / n)
            .sqrt();
        let (min, max) = match episodes.iter().map(|e| e.ret).minmax_by(|x, y| x.total_cmp(y)) {
            MinMaxResult::NoElements => (f32::NAN, f32::NAN),
            MinMaxResult::OneElement(x) => (x, x),
            MinMaxResult::MinMax(x, y) => (x, y),
        };
        let termination_rate = episodes.iter().filter(|e| e.is_terminated).count() as f32 / n;

        info!(
            "Evaluation over {} episodes: average return = {}, average discounted return = {}",
            episodes.len(),
            mean,
            mean_discounted
        );

        Ok(Record::from_slice(&[
            (
                "Evaluation/NumEpisodes",
                RecordValue::Scalar(episodes.len() as f32),
            ),
            (
                "Evaluation/AverageDiscountedReturn",
                RecordValue::Scalar(mean_discounted),
            ),
            ("Evaluation/AverageReturn", RecordValue::Scalar(mean)),
            ("Evaluation/StdReturn", RecordValue::Scalar(std)),
            ("Evaluation/MaxReturn", RecordValue::Scalar(max)),
            ("Evaluation/MinReturn", RecordValue::Scalar(min)),
            (
                "Evaluation/TerminationRate",
                RecordValue::Scalar(termination_rate),
            ),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PointAct, PointEnv, PointEnvConfig, PointObs};

    struct Still;

    impl Policy<PointEnv> for Still {
        fn sample(&mut self, obs: &PointObs) -> Result<PointAct> {
            Ok(PointAct(vec![0.0; obs.0.len()]))
        }
    }

    #[test]
    fn test_discounted_return() -> Result<()> {
        // The point never moves, so every reward equals the initial -distance
        let config = PointEnvConfig::default().max_steps(3);
        let mut evaluator = DefaultEvaluator::<PointEnv>::new(&config, 0)?;
        let record = evaluator.evaluate(&mut Still, 2, 0.5)?;

        let ret = record.get_scalar("Evaluation/AverageReturn")?;
        let discounted = record.get_scalar("Evaluation/AverageDiscountedReturn")?;
        assert!((discounted - ret * (1.0 + 0.5 + 0.25) / 3.0).abs() < 1e-5);
        assert_eq!(record.get_scalar("Evaluation/NumEpisodes")?, 2.0);
        assert_eq!(record.get_scalar("Evaluation/TerminationRate")?, 0.0);
        assert!(
            record.get_scalar("Evaluation/MinReturn")? <= record.get_scalar("Evaluation/MaxReturn")?
        );
        Ok(())
    }
}
