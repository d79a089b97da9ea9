//! Worker error types.

use thiserror::Error;

use crate::services::ServiceError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// A step's input is neither local nor in the store.
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Model(#[from] dub_models::ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] dub_storage::StorageError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] dub_firestore::FirestoreError),

    #[error(transparent)]
    Media(#[from] dub_media::MediaError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// An external tool exited unsuccessfully.
    pub fn is_process_failure(&self) -> bool {
        match self {
            WorkerError::Media(e) | WorkerError::Service(ServiceError::Media(e)) => {
                e.is_process_failure()
            }
            _ => false,
        }
    }

    /// Message appended to the job log when a job ends with this error.
    pub fn job_log_message(&self) -> String {
        if self.is_process_failure() {
            format!("Subprocess error: {}", self)
        } else {
            format!("Failed: {}", self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dub_media::MediaError;

    #[test]
    fn test_process_failures_are_classified() {
        let direct = WorkerError::from(MediaError::process_failed("ffmpeg", Some(1), "bad input"));
        assert!(direct.is_process_failure());

        let via_service = WorkerError::from(ServiceError::from(MediaError::process_failed(
            "yt-dlp",
            Some(1),
            "ERROR: Video unavailable",
        )));
        assert!(via_service.is_process_failure());
        assert_eq!(
            via_service.job_log_message(),
            "Subprocess error: yt-dlp exited with 1: ERROR: Video unavailable"
        );
    }

    #[test]
    fn test_generic_failures() {
        let missing_tool = WorkerError::from(MediaError::YtDlpNotFound);
        assert!(!missing_tool.is_process_failure());

        let err = WorkerError::missing_input("subs/abc/pt.srt");
        assert_eq!(err.job_log_message(), "Failed: Missing input: subs/abc/pt.srt");
    }
}
