//! Exploration noise of DDPG agent.
use anyhow::Result;
use candle_core::Tensor;
use ddpg_core::error::DdpgError;
use serde::{Deserialize, Serialize};

/// Noise added to actions of the actor in training mode.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum ExplorationNoise {
    /// Independent Gaussian noise.
    Gaussian {
        /// Standard deviation.
        sigma: f64,
    },

    /// Ornstein-Uhlenbeck process, reset at the start of every episode.
    OrnsteinUhlenbeck {
        /// Mean of the process.
        mu: f64,
        /// Rate of mean reversion.
        theta: f64,
        /// Scale of the Wiener process.
        sigma: f64,
        /// Time step.
        #[serde(default = "default_dt")]
        dt: f64,
    },
}

fn default_dt() -> f64 {
    1e-2
}

impl Default for ExplorationNoise {
    fn default() -> Self {
        Self::Gaussian { sigma: 0.1 }
    }
}

impl ExplorationNoise {
    /// Checks the parameters of the noise.
    pub fn validate(&self) -> Result<(), DdpgError> {
        let ok = match self {
            Self::Gaussian { sigma } => *sigma >= 0.0,
            Self::OrnsteinUhlenbeck {
                theta, sigma, dt, ..
            } => *theta >= 0.0 && *sigma >= 0.0 && *dt > 0.0,
        };
        match ok {
            true => Ok(()),
            false => Err(DdpgError::Configuration(format!(
                "Invalid exploration noise: {:?}",
                self
            ))),
        }
    }
}

/// Perturbs actions with [`ExplorationNoise`].
pub(super) struct Explorer {
    noise: ExplorationNoise,
    ou_state: Option<Tensor>,
}

impl Explorer {
    pub fn new(noise: ExplorationNoise) -> Self {
        Self {
            noise,
            ou_state: None,
        }
    }

    /// Restarts the Ornstein-Uhlenbeck process from its mean.
    pub fn reset(&mut self) {
        self.ou_state = None;
    }

    /// Returns `act + noise`, clipped to `[-max_action, max_action]`.
    pub fn perturb(&mut self, act: &Tensor, max_action: f64) -> Result<Tensor> {
        let noise = match &self.noise {
            ExplorationNoise::Gaussian { sigma } => gaussian(act, *sigma)?,
            ExplorationNoise::OrnsteinUhlenbeck {
                mu,
                theta,
                sigma,
                dt,
            } => {
                let x = match &self.ou_state {
                    Some(x) => x.clone(),
                    None => (act.ones_like()? * *mu)?,
                };
                let drift = ((*mu - &x)? * (*theta * *dt))?;
                let diffusion = gaussian(act, *sigma * dt.sqrt())?;
                let x = ((x + drift)? + diffusion)?;
                self.ou_state = Some(x.clone());
                x
            }
        };
        Ok((act + noise)?.clamp(-max_action, max_action)?)
    }
}

/// Draws `N(0, sigma)` noise with the shape of `t`.
pub(super) fn gaussian(t: &Tensor, sigma: f64) -> Result<Tensor> {
    match sigma > 0.0 {
        true => Ok(Tensor::randn(0f32, sigma as f32, t.dims(), t.device())?),
        false => Ok(t.zeros_like()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_perturbed_actions_are_clipped() -> Result<()> {
        let mut explorer = Explorer::new(ExplorationNoise::Gaussian { sigma: 10.0 });
        let act = Tensor::zeros((100, 3), DType::F32, &Device::Cpu)?;
        let act = explorer.perturb(&act, 0.5)?;
        let max = act.abs()?.flatten_all()?.max(0)?.to_scalar::<f32>()?;
        assert!(max <= 0.5);
        assert!(max > 0.0);
        Ok(())
    }

    #[test]
    fn test_ou_state_is_reset() -> Result<()> {
        let noise = ExplorationNoise::OrnsteinUhlenbeck {
            mu: 0.0,
            theta: 0.15,
            sigma: 0.2,
            dt: 1e-2,
        };
        let mut explorer = Explorer::new(noise);
        let act = Tensor::zeros((1, 2), DType::F32, &Device::Cpu)?;
        explorer.perturb(&act, 1.0)?;
        assert!(explorer.ou_state.is_some());
        explorer.reset();
        assert!(explorer.ou_state.is_none());
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(ExplorationNoise::default().validate().is_ok());
        assert!(ExplorationNoise::Gaussian { sigma: -0.1 }.validate().is_err());
    }
}
