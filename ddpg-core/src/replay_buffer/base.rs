//! Ring buffer of transitions.
use super::{EpisodeBatch, Transition, TransitionBatch, TransitionBufferConfig};
use crate::{error::DdpgError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use log::info;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// A replay buffer storing transitions of fixed dimension.
///
/// Vector-valued fields are kept in flat preallocated vectors. When the buffer
/// is full, the oldest transitions are overwritten.
pub struct TransitionBuffer {
    capacity: usize,
    i: usize,
    size: usize,
    obs_dim: usize,
    act_dim: usize,
    obs: Vec<f32>,
    act: Vec<f32>,
    next_obs: Vec<f32>,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    rng: StdRng,
}

/// Borrowed view of the stored transitions, written by [`TransitionBuffer::save`].
#[derive(Serialize)]
struct ContentsRef<'a> {
    capacity: usize,
    i: usize,
    size: usize,
    obs_dim: usize,
    act_dim: usize,
    obs: &'a [f32],
    act: &'a [f32],
    next_obs: &'a [f32],
    reward: &'a [f32],
    is_terminated: &'a [i8],
}

#[derive(Deserialize)]
struct Contents {
    capacity: usize,
    i: usize,
    size: usize,
    obs_dim: usize,
    act_dim: usize,
    obs: Vec<f32>,
    act: Vec<f32>,
    next_obs: Vec<f32>,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
}

impl TransitionBuffer {
    /// Appends every transition of `batch`.
    ///
    /// Nothing is stored if any transition has an unexpected dimension.
    pub fn add_episode_batch(&mut self, batch: EpisodeBatch) -> Result<()> {
        for tr in batch.transitions.iter() {
            self.check_dims(tr)?;
        }
        for tr in batch.transitions.into_iter() {
            self.push_transition(tr);
        }
        Ok(())
    }

    /// Samples `n` transitions uniformly at random with replacement.
    pub fn sample_transitions(&mut self, n: usize) -> Result<TransitionBatch> {
        if self.size == 0 {
            return Err(DdpgError::EmptyBuffer.into());
        }
        let ixs = (0..n)
            .map(|_| (self.rng.next_u32() as usize) % self.size)
            .collect::<Vec<_>>();
        Ok(self.gather(ixs))
    }

    /// Returns the number of stored transitions.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the transition stored at index `ix`.
    pub fn get(&self, ix: usize) -> Option<Transition> {
        if ix >= self.size {
            return None;
        }
        let (o, a) = (self.obs_dim, self.act_dim);
        Some(Transition {
            obs: self.obs[ix * o..(ix + 1) * o].to_vec(),
            act: self.act[ix * a..(ix + 1) * a].to_vec(),
            reward: self.reward[ix],
            next_obs: self.next_obs[ix * o..(ix + 1) * o].to_vec(),
            is_terminated: self.is_terminated[ix] == 1,
        })
    }

    fn check_dims(&self, tr: &Transition) -> Result<(), DdpgError> {
        let check = |field: &'static str, expected: usize, got: usize| {
            if expected == got {
                Ok(())
            } else {
                Err(DdpgError::ShapeMismatch {
                    field,
                    expected,
                    got,
                })
            }
        };
        check("obs", self.obs_dim, tr.obs.len())?;
        check("act", self.act_dim, tr.act.len())?;
        check("next_obs", self.obs_dim, tr.next_obs.len())
    }

    #[inline]
    fn push_transition(&mut self, tr: Transition) {
        let (i, o, a) = (self.i, self.obs_dim, self.act_dim);
        self.obs[i * o..(i + 1) * o].copy_from_slice(&tr.obs);
        self.act[i * a..(i + 1) * a].copy_from_slice(&tr.act);
        self.next_obs[i * o..(i + 1) * o].copy_from_slice(&tr.next_obs);
        self.reward[i] = tr.reward;
        self.is_terminated[i] = tr.is_terminated as i8;

        self.i = (self.i + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);
    }

    fn gather(&self, ixs: Vec<usize>) -> TransitionBatch {
        let (o, a) = (self.obs_dim, self.act_dim);
        let rows = |src: &Vec<f32>, dim: usize| {
            ixs.iter()
                .flat_map(|ix| src[ix * dim..(ix + 1) * dim].iter().copied())
                .collect::<Vec<_>>()
        };

        TransitionBatch {
            obs: rows(&self.obs, o),
            act: rows(&self.act, a),
            next_obs: rows(&self.next_obs, o),
            reward: ixs.iter().map(|ix| self.reward[*ix]).collect(),
            is_terminated: ixs
                .iter()
                .map(|ix| self.is_terminated[*ix] as f32)
                .collect(),
            obs_dim: o,
            act_dim: a,
            ix_sample: ixs,
        }
    }
}

impl ExperienceBufferBase for TransitionBuffer {
    type Item = EpisodeBatch;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.add_episode_batch(tr)
    }
}

impl ReplayBufferBase for TransitionBuffer {
    type Config = TransitionBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            capacity,
            i: 0,
            size: 0,
            obs_dim: config.obs_dim,
            act_dim: config.act_dim,
            obs: vec![0.; capacity * config.obs_dim],
            act: vec![0.; capacity * config.act_dim],
            next_obs: vec![0.; capacity * config.obs_dim],
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample_transitions(size)
    }

    /// Writes the stored transitions and the write cursor with bincode.
    fn save(&self, path: &Path) -> Result<()> {
        let (n, o, a) = (self.size, self.obs_dim, self.act_dim);
        let contents = ContentsRef {
            capacity: self.capacity,
            i: self.i,
            size: n,
            obs_dim: o,
            act_dim: a,
            obs: &self.obs[..n * o],
            act: &self.act[..n * a],
            next_obs: &self.next_obs[..n * o],
            reward: &self.reward[..n],
            is_terminated: &self.is_terminated[..n],
        };
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &contents)?;
        info!("Saved {} transitions to {:?}", n, path);
        Ok(())
    }

    /// Restores transitions written by [`save`](ReplayBufferBase::save).
    ///
    /// The capacity and dimensions of the saved buffer must match those of
    /// `self`. On error, the buffer is left untouched.
    fn load(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let c: Contents = bincode::deserialize_from(reader)
            .map_err(|e| DdpgError::Serialization(format!("{:?}: {}", path, e)))?;

        let mismatch = |what: &str, saved: usize, current: usize| {
            DdpgError::Serialization(format!(
                "{} of saved replay buffer is {}, expected {}",
                what, saved, current
            ))
        };
        if c.capacity != self.capacity {
            return Err(mismatch("capacity", c.capacity, self.capacity).into());
        }
        if c.obs_dim != self.obs_dim {
            return Err(mismatch("obs_dim", c.obs_dim, self.obs_dim).into());
        }
        if c.act_dim != self.act_dim {
            return Err(mismatch("act_dim", c.act_dim, self.act_dim).into());
        }
        let (n, o, a) = (c.size, c.obs_dim, c.act_dim);
        if n > c.capacity
            || c.i >= c.capacity
            || c.obs.len() != n * o
            || c.next_obs.len() != n * o
            || c.act.len() != n * a
            || c.reward.len() != n
            || c.is_terminated.len() != n
        {
            return Err(DdpgError::Serialization(format!("{:?}: corrupted contents", path)).into());
        }

        self.obs[..n * o].copy_from_slice(&c.obs);
        self.act[..n * a].copy_from_slice(&c.act);
        self.next_obs[..n * o].copy_from_slice(&c.next_obs);
        self.reward[..n].copy_from_slice(&c.reward);
        self.is_terminated[..n].copy_from_slice(&c.is_terminated);
        self.i = c.i;
        self.size = n;
        info!("Loaded {} transitions from {:?}", n, path);
        Ok(())
    }
}
