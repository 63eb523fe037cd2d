//! Error types for the mlsim-core crate.

use thiserror::Error;

use crate::data::DataPoint;

/// Top-level error type for simulation runs.
///
/// Numerically degenerate inputs (a constant regression target, a single
/// class) are not errors: they surface as `NaN` or infinite metrics in the
/// result instead.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    pub fn unsupported(tag: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm(tag.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<figment::Error> for SimError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Reject the one input no trainer can run on.
pub(crate) fn ensure_not_empty(data: &[DataPoint]) -> Result<(), SimError> {
    if data.is_empty() {
        return Err(SimError::EmptyDataset);
    }
    Ok(())
}
