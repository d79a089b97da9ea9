//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Unknown job status: {0}")]
    UnknownStatus(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLang(String),
}
