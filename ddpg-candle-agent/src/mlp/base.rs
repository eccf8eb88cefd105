use super::{mlp_forward, MlpConfig};
use crate::model::{SubModel1, SubModel2};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use candle_nn::{linear, Linear, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter().cloned());
    dims.push(config.out_dim);
    let vs = vs.pp(prefix);

    let mut layers = Vec::with_capacity(dims.len() - 1);
    for (i, pair) in dims.windows(2).enumerate() {
        layers.push(linear(pair[0], pair[1], vs.pp(format!("ln{}", i)))?);
    }
    Ok(layers)
}

/// Multilayer perceptron with ReLU activation function.
///
/// Variables are named `mlp.ln{i}.weight` and `mlp.ln{i}.bias`.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl Mlp {
    fn _build(vs: VarBuilder, config: MlpConfig) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }

    fn _forward(&self, xs: Tensor) -> Result<Tensor> {
        let xs = mlp_forward(xs, &self.layers)?;

        match self.config.activation_out {
            false => Ok(xs),
            true => Ok(xs.relu()?),
        }
    }
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        self._forward(xs)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::_build(vs, config)
    }
}

impl SubModel2 for Mlp {
    type Config = MlpConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Tensor> {
        let input1 = input1.to_device(&self.device)?;
        let input2 = input2.to_device(&self.device)?;
        let input = Tensor::cat(&[input1, input2], D::Minus1)?;
        self._forward(input)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::_build(vs, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_mlp_shapes_and_names() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = <Mlp as SubModel2>::build(vb, MlpConfig::new(3, vec![8, 8], 1, false))?;

        let obs = Tensor::zeros((5, 2), DType::F32, &Device::Cpu)?;
        let act = Tensor::zeros((5, 1), DType::F32, &Device::Cpu)?;
        let q = SubModel2::forward(&mlp, &obs, &act)?;
        assert_eq!(q.dims(), [5, 1]);

        let mut names: Vec<_> = varmap.data().lock().unwrap().keys().cloned().collect();
        names.sort();
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "mlp.ln0.bias");
        assert_eq!(names[1], "mlp.ln0.weight");
        Ok(())
    }
}
