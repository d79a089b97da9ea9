//! Structured job logging.
//!
//! Every line a job writes to its ledger log is mirrored here with the job
//! id as a field. Lines written while a step runs also carry the step name
//! from the enclosing step span.

use tracing::{error, info, warn, Span};

use dub_models::JobId;

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    video_id: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, video_id: Option<&str>) -> Self {
        Self {
            job_id: job_id.to_string(),
            video_id: video_id.unwrap_or("-").to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, video_id = %self.video_id, "Job started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, "{}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, "{}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, video_id = %self.video_id, "Job error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, video_id = %self.video_id, "Job completed: {}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Span wrapping the whole job run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, video_id = %self.video_id)
    }

    /// Child span for one step of the run.
    pub fn step_span(&self, step: &str) -> Span {
        tracing::info_span!("step", job_id = %self.job_id, step = %step)
    }
}
