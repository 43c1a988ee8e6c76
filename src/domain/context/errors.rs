//! Context detection errors.

use thiserror::Error;

/// Errors raised by a context detector. Callers treat any of these as
/// "no shift".
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContextDetectionError {
    #[error("Context detector unavailable: {0}")]
    Unavailable(String),

    #[error("Context detector returned invalid output: {0}")]
    InvalidOutput(String),
}
