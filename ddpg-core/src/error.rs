//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Fallible functions return [`anyhow::Result`]; errors raised by this crate
/// and by agent implementations are wrapped values of this enum and can be
/// recovered with `err.downcast_ref::<DdpgError>()`.
#[derive(Error, Debug, PartialEq)]
pub enum DdpgError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// Invalid hyperparameters, detected before any training occurs.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A loss or value estimate became NaN or infinite.
    #[error("Numeric divergence: {name} = {value}")]
    NumericDivergence {
        /// Name of the diverged quantity.
        name: String,
        /// The offending value.
        value: f32,
    },

    /// A snapshot could not be restored.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A vector does not have the dimension fixed at construction.
    #[error("Shape mismatch in {field}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Name of the field.
        field: &'static str,
        /// Dimension fixed at construction.
        expected: usize,
        /// Dimension of the given data.
        got: usize,
    },

    /// Sampling from a buffer holding no transitions.
    #[error("Replay buffer is empty")]
    EmptyBuffer,
}

/// Returns [`DdpgError::NumericDivergence`] if `value` is not finite.
pub fn check_finite(name: &str, value: f32) -> Result<f32, DdpgError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DdpgError::NumericDivergence {
            name: name.to_string(),
            value,
        })
    }
}
