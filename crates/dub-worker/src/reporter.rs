//! Job progress reporting to the ledger.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use dub_firestore::JobLedger;
use dub_models::{JobId, JobStatus};

use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// Writes log lines and status changes for one job.
///
/// Log entries carry a UTC timestamp prefix, which also keeps repeated
/// messages distinct under the ledger's array-union append.
pub struct JobReporter {
    ledger: Arc<dyn JobLedger>,
    job_id: JobId,
    logger: JobLogger,
}

impl JobReporter {
    pub fn new(ledger: Arc<dyn JobLedger>, job_id: JobId, logger: JobLogger) -> Self {
        Self {
            ledger,
            job_id,
            logger,
        }
    }

    pub fn logger(&self) -> &JobLogger {
        &self.logger
    }

    pub async fn log(&self, message: impl AsRef<str>) -> WorkerResult<()> {
        let message = message.as_ref();
        self.logger.log_progress(message);
        self.append(message).await
    }

    /// Same as [`log`](Self::log) at warning level.
    pub async fn warn(&self, message: impl AsRef<str>) -> WorkerResult<()> {
        let message = message.as_ref();
        self.logger.log_warning(message);
        self.append(message).await
    }

    pub async fn set_status(&self, status: JobStatus, step: Option<&str>) -> WorkerResult<()> {
        self.ledger.set_status(&self.job_id, status, step).await?;
        Ok(())
    }

    async fn append(&self, message: &str) -> WorkerResult<()> {
        self.ledger
            .append_log(&self.job_id, &stamp(message))
            .await?;
        Ok(())
    }
}

pub fn stamp(message: &str) -> String {
    format!(
        "[{}] {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_prefix() {
        let line = stamp("Completed");
        assert!(line.starts_with('['));
        assert!(line.ends_with("Z] Completed"));
    }
}
