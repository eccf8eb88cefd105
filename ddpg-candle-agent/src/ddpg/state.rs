//! Counters and rolling statistics of DDPG agent.
use crate::util::summary;
use ddpg_core::record::{Record, RecordValue::Scalar};
use serde::{Deserialize, Serialize};

/// Values computed in an optimization step.
#[derive(Debug, Clone, PartialEq)]
pub struct OptStats {
    /// Loss of the critic, including weight decay.
    pub qf_loss: f32,

    /// Regression targets of the critic.
    pub y: Vec<f32>,

    /// Action values of the batch before the critic update.
    pub q: Vec<f32>,

    /// Loss of the actor, including weight decay.
    pub policy_loss: f32,
}

/// Training counters and per-epoch statistics.
///
/// Only the counters are persisted; the rolling statistics cover the
/// current logging interval and are reset by [`AlgorithmState::epoch_record`].
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct AlgorithmState {
    /// The number of optimization steps.
    pub n_opts: usize,

    /// The number of gradient steps on the critic.
    pub n_qf_updates: usize,

    /// The number of gradient steps on the actor.
    pub n_policy_updates: usize,

    #[serde(skip)]
    policy_losses: Vec<f32>,

    #[serde(skip)]
    qf_losses: Vec<f32>,

    #[serde(skip)]
    q_values: Vec<f32>,

    #[serde(skip)]
    y_values: Vec<f32>,
}

impl AlgorithmState {
    /// Accumulates the result of an optimization step.
    pub fn push(&mut self, stats: OptStats) {
        self.policy_losses.push(stats.policy_loss);
        self.qf_losses.push(stats.qf_loss);
        self.q_values.extend(stats.q);
        self.y_values.extend(stats.y);
    }

    /// The number of optimization steps in the current interval.
    pub fn interval_len(&self) -> usize {
        self.qf_losses.len()
    }

    /// Returns the statistics of the current interval and starts a new one.
    ///
    /// If no optimization step happened in the interval, only `Epoch` is
    /// recorded.
    pub fn epoch_record(&mut self, epoch: usize) -> Record {
        let mut record = Record::from_scalar("Epoch", epoch as f32);

        if self.interval_len() > 0 {
            let (avg_policy_loss, _, _) = summary(&self.policy_losses);
            let (avg_qf_loss, _, _) = summary(&self.qf_losses);
            let (avg_q, max_q, avg_abs_q) = summary(&self.q_values);
            let (avg_y, max_y, avg_abs_y) = summary(&self.y_values);

            record.insert("Policy/AveragePolicyLoss", Scalar(avg_policy_loss));
            record.insert("QFunction/AverageQFunctionLoss", Scalar(avg_qf_loss));
            record.insert("QFunction/AverageQ", Scalar(avg_q));
            record.insert("QFunction/MaxQ", Scalar(max_q));
            record.insert("QFunction/AverageAbsQ", Scalar(avg_abs_q));
            record.insert("QFunction/AverageY", Scalar(avg_y));
            record.insert("QFunction/MaxY", Scalar(max_y));
            record.insert("QFunction/AverageAbsY", Scalar(avg_abs_y));
        }

        self.reset_interval();
        record
    }

    /// Clears the rolling statistics, keeping the counters.
    pub fn reset_interval(&mut self) {
        self.policy_losses.clear();
        self.qf_losses.clear();
        self.q_values.clear();
        self.y_values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_epoch_record() -> Result<()> {
        let mut state = AlgorithmState::default();
        state.push(OptStats {
            qf_loss: 1.0,
            y: vec![1.0, -3.0],
            q: vec![2.0, 0.0],
            policy_loss: -2.0,
        });
        state.push(OptStats {
            qf_loss: 3.0,
            y: vec![2.0, 4.0],
            q: vec![-6.0, 0.0],
            policy_loss: -4.0,
        });

        let record = state.epoch_record(5);
        assert_eq!(record.len(), 9);
        assert_eq!(record.get_scalar("Epoch")?, 5.0);
        assert_eq!(record.get_scalar("Policy/AveragePolicyLoss")?, -3.0);
        assert_eq!(record.get_scalar("QFunction/AverageQFunctionLoss")?, 2.0);
        assert_eq!(record.get_scalar("QFunction/AverageQ")?, -1.0);
        assert_eq!(record.get_scalar("QFunction/MaxQ")?, 2.0);
        assert_eq!(record.get_scalar("QFunction/AverageAbsQ")?, 2.0);
        assert_eq!(record.get_scalar("QFunction/AverageY")?, 1.0);
        assert_eq!(record.get_scalar("QFunction/MaxY")?, 4.0);
        assert_eq!(record.get_scalar("QFunction/AverageAbsY")?, 2.5);

        // The interval is reset, the counters are not
        assert_eq!(state.interval_len(), 0);
        let record = state.epoch_record(6);
        assert_eq!(record.len(), 1);
        Ok(())
    }

    #[test]
    fn test_only_counters_are_persisted() -> Result<()> {
        let mut state = AlgorithmState {
            n_opts: 3,
            n_qf_updates: 3,
            n_policy_updates: 2,
            ..Default::default()
        };
        state.push(OptStats {
            qf_loss: 1.0,
            y: vec![1.0],
            q: vec![1.0],
            policy_loss: 1.0,
        });
        let restored: AlgorithmState = serde_yaml::from_str(&serde_yaml::to_string(&state)?)?;
        assert_eq!(restored.n_opts, 3);
        assert_eq!(restored.n_policy_updates, 2);
        assert_eq!(restored.interval_len(), 0);
        Ok(())
    }
}
