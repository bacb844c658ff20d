//! Error types for phyz-gauge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GaugeError {
    /// The small-angle link `a0 = sqrt(1 - |a|²/4)` only exists for `|a|²/4 < 1`.
    /// Hitting this means the field is too strong for the chosen time step.
    #[error("linearized exponential out of range: |a|²/4 = {quarter_square_norm} must be < 1")]
    LinearizedExpOutOfRange { quarter_square_norm: f64 },
}

pub type Result<T> = std::result::Result<T, GaugeError>;
