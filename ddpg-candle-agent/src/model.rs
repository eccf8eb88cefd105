//! Interface of neural networks used in the agent.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::VarBuilder;

/// Neural network model not owing its [`VarMap`] internally.
///
/// [`VarMap`]: https://docs.rs/candle-nn/0.8.4/candle_nn/var_map/struct.VarMap.html
pub trait SubModel1 {
    /// Configuration from which [`SubModel1`] is constructed.
    type Config;

    /// Input of the [`SubModel1`].
    type Input;

    /// Output of the [`SubModel1`].
    type Output;

    /// Builds [`SubModel1`] with [`VarBuilder`] and [`SubModel1::Config`].
    ///
    /// [`VarBuilder`]: https://docs.rs/candle-nn/0.8.4/candle_nn/var_builder/type.VarBuilder.html
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// Neural network model not owing its [`VarMap`] internally.
///
/// The difference from [`SubModel1`] is that this trait takes two inputs.
///
/// [`VarMap`]: https://docs.rs/candle-nn/0.8.4/candle_nn/var_map/struct.VarMap.html
pub trait SubModel2 {
    /// Configuration from which [`SubModel2`] is constructed.
    type Config;

    /// Input of the [`SubModel2`].
    type Input1;

    /// Input of the [`SubModel2`].
    type Input2;

    /// Output of the [`SubModel2`].
    type Output;

    /// Builds [`SubModel2`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Self::Output>;
}

/// A function approximator owning its parameters.
///
/// Target networks are created with [`ParameterizedFunction::clone_as`].
pub trait ParameterizedFunction {
    /// Name of the function, used in logs and file names.
    fn name(&self) -> &str;

    /// Returns an independent copy with identical architecture and
    /// parameter values.
    ///
    /// Later updates of either copy do not affect the other.
    fn clone_as(&self, name: &str) -> Result<Self>
    where
        Self: Sized;

    /// All parameters updated by gradient steps.
    fn trainable_parameters(&self) -> Vec<Var>;

    /// Parameters subject to L2 weight decay, i.e., weight matrices but not
    /// biases.
    fn regularizable_parameters(&self) -> Result<Vec<Var>>;

    /// Returns `decay * Σ‖w‖²` over [`regularizable_parameters`], or `None`
    /// if `decay == 0`.
    ///
    /// [`regularizable_parameters`]: ParameterizedFunction::regularizable_parameters
    fn l2_penalty(&self, decay: f64) -> Result<Option<Tensor>> {
        let vars = self.regularizable_parameters()?;
        if decay == 0.0 || vars.is_empty() {
            return Ok(None);
        }
        Ok(Some((crate::util::sum_of_squares(&vars)? * decay)?))
    }
}
