//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{Tensor, Var};
use candle_nn::VarMap;
use log::trace;
use std::{collections::HashMap, sync::MutexGuard};

fn lock(varmap: &VarMap) -> Result<MutexGuard<HashMap<String, Var>>> {
    varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("VarMap lock is poisoned"))
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = dest + tau * (src - dest)
///
/// A variable whose value equals the source is left unchanged. With
/// `tau == 1.0` the source values are copied.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track(tau = {})", tau);
    let dest = lock(dest)?;
    let src = lock(src)?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} is not in the source", k_dest))?;
        let t_src = v_src.as_tensor();
        if tau == 1.0 {
            v_dest.set(t_src)?;
            continue;
        }
        let t_dest = v_dest.as_tensor();
        let delta = ((t_src - t_dest)? * tau)?;
        v_dest.set(&(t_dest + delta)?)?;
    }

    Ok(())
}

/// Copies the values of all variables of `src` into `dest`.
///
/// The variables keep their own storage, so `dest` stays independent of
/// `src` afterwards.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = lock(dest)?;
    let src = lock(src)?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} is not in the source", k_dest))?;
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// Returns the weight matrices of the linear layers in `varmap`, ordered by
/// name. Biases are excluded.
pub fn weights(varmap: &VarMap) -> Result<Vec<Var>> {
    let data = lock(varmap)?;
    let mut weights: Vec<_> = data.iter().filter(|(k, _)| k.ends_with(".weight")).collect();
    weights.sort_by(|a, b| a.0.cmp(b.0));
    Ok(weights.into_iter().map(|(_, v)| v.clone()).collect())
}

/// Returns the sum of squares of all elements of the variables as a scalar
/// tensor.
pub fn sum_of_squares(vars: &[Var]) -> Result<Tensor> {
    let mut vars = vars.iter();
    let first = vars
        .next()
        .ok_or_else(|| anyhow!("No variables to regularize"))?;
    let mut sum = first.as_tensor().sqr()?.sum_all()?;
    for var in vars {
        sum = (sum + var.as_tensor().sqr()?.sum_all()?)?;
    }
    Ok(sum)
}

/// Returns `(mean, max, mean of absolute values)` of the values.
///
/// All three are `NaN` for an empty slice.
pub fn summary(xs: &[f32]) -> (f32, f32, f32) {
    if xs.is_empty() {
        return (f32::NAN, f32::NAN, f32::NAN);
    }
    let n = xs.len() as f32;
    let mean = xs.iter().sum::<f32>() / n;
    let max = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mean_abs = xs.iter().map(|x| x.abs()).sum::<f32>() / n;
    (mean, max, mean_abs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::Init;

    fn varmap(values: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((values.len(),), "var1", init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(values, (values.len(),), &Device::Cpu)?;
        lock(&vm)?["var1"].set(&t)?;
        Ok(vm)
    }

    fn values(vm: &VarMap) -> Result<Vec<f32>> {
        Ok(lock(vm)?["var1"].as_tensor().to_vec1()?)
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let vm_src = varmap(&[1.0, 2.0, 3.0])?;
        let vm_dest = varmap(&[4.0, 5.0, 6.0])?;
        track(&vm_dest, &vm_src, tau)?;

        let expected = [
            0.7 * 1.0 + 0.3 * 4.0,
            0.7 * 2.0 + 0.3 * 5.0,
            0.7 * 3.0 + 0.3 * 6.0,
        ];
        for (v, e) in values(&vm_dest)?.iter().zip(expected.iter()) {
            assert!((v - e).abs() < 1e-6);
        }
        // Source is untouched
        assert_eq!(values(&vm_src)?, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_track_with_tau_one_copies() -> Result<()> {
        let vm_src = varmap(&[1.0, -2.0])?;
        let vm_dest = varmap(&[4.0, 5.0])?;
        track(&vm_dest, &vm_src, 1.0)?;
        assert_eq!(values(&vm_dest)?, vec![1.0, -2.0]);
        Ok(())
    }

    #[test]
    fn test_track_keeps_equal_values() -> Result<()> {
        let xs: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.37).sin() * 3.0).collect();
        let vm_src = varmap(&xs)?;
        let vm_dest = varmap(&xs)?;
        track(&vm_dest, &vm_src, 0.3)?;
        assert_eq!(values(&vm_dest)?, xs);
        Ok(())
    }

    #[test]
    fn test_hard_update_is_independent() -> Result<()> {
        let vm_src = varmap(&[1.0, 2.0])?;
        let vm_dest = varmap(&[0.0, 0.0])?;
        hard_update(&vm_dest, &vm_src)?;
        assert_eq!(values(&vm_dest)?, values(&vm_src)?);

        let t = Tensor::from_slice(&[9f32, 9.0], (2,), &Device::Cpu)?;
        lock(&vm_src)?["var1"].set(&t)?;
        assert_eq!(values(&vm_dest)?, vec![1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_sum_of_squares() -> Result<()> {
        let vm1 = varmap(&[1.0, 2.0])?;
        let vm2 = varmap(&[3.0])?;
        let vars = [lock(&vm1)?["var1"].clone(), lock(&vm2)?["var1"].clone()];
        assert_eq!(sum_of_squares(&vars)?.to_scalar::<f32>()?, 14.0);
        assert!(sum_of_squares(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_summary() {
        let (mean, max, mean_abs) = summary(&[-3.0, 1.0]);
        assert_eq!((mean, max, mean_abs), (-1.0, 1.0, 2.0));
        assert!(summary(&[]).0.is_nan());
    }
}
