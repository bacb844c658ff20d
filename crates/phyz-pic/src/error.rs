//! Error types for phyz-pic.

use phyz_gauge::GaugeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PicError {
    /// A particle moved more than one cell along `axis` in a single step.
    /// Deposition would silently lose charge, so the pass is aborted.
    #[error("particle too fast: displacement {displacement} cells along axis {axis} exceeds 1")]
    ParticleTooFast { axis: usize, displacement: f64 },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Gauge error: {0}")]
    Gauge(#[from] GaugeError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PicError>;
