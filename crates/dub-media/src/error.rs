//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    /// External tool ran and exited unsuccessfully.
    #[error("{program} exited with {}: {stderr}", code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Expected output not produced: {0}")]
    MissingOutput(PathBuf),

    #[error("Invalid tool output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn process_failed(program: impl Into<String>, code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            program: program.into(),
            code,
            stderr: stderr.into(),
        }
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Whether an external tool ran and failed, as opposed to any other error.
    pub fn is_process_failure(&self) -> bool {
        matches!(self, MediaError::ProcessFailed { .. })
    }
}
