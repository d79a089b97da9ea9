//! Job records tracked in the ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;
use crate::step::Step;

/// Ledger document id of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Allowed moves: `queued -> running -> {done, failed}`, plus
    /// `queued -> failed` for jobs rejected before any work starts.
    /// Re-entering `running` is permitted so a resumed job can re-announce itself.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Queued, Running) | (Queued, Failed) | (Running, Running) | (Running, Done) | (Running, Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// A localization job as read from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub video_id: Option<String>,
    pub status: JobStatus,
    /// Raw step names as stored; resolved with [`Job::resolved_steps`].
    pub steps: Option<Vec<String>>,
    pub current_step: Option<String>,
    #[serde(default)]
    pub log: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Worker that claimed the job, when atomic claiming is enabled.
    pub claimed_by: Option<String>,
    /// Document revision (`updateTime`) the record was read at.
    pub revision: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<JobId>, video_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            video_id: Some(video_id.into()),
            status: JobStatus::Queued,
            steps: None,
            current_step: None,
            log: Vec::new(),
            updated_at: None,
            claimed_by: None,
            revision: None,
        }
    }

    pub fn with_steps<S: Into<String>>(mut self, steps: impl IntoIterator<Item = S>) -> Self {
        self.steps = Some(steps.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    /// Video id, treating an empty string as missing.
    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// The job's step list, or the default pipeline when unset or empty.
    pub fn resolved_steps(&self) -> Result<Vec<Step>, ModelError> {
        match &self.steps {
            Some(names) if !names.is_empty() => Step::parse_list(names),
            _ => Ok(Step::default_pipeline()),
        }
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Lang;

    #[test]
    fn test_status_transitions() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Done));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Failed));
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Running));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Queued));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Queued));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn test_terminal_statuses_are_final() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Running));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("running".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert!("processing".parse::<JobStatus>().is_err());
        assert_eq!(JobStatus::Done.to_string(), "done");
    }

    #[test]
    fn test_resolved_steps_defaults() {
        let job = Job::new("j1", "abc");
        assert_eq!(job.resolved_steps().unwrap(), Step::default_pipeline());

        let empty = Job::new("j2", "abc").with_steps(Vec::<String>::new());
        assert_eq!(empty.resolved_steps().unwrap().len(), 8);
    }

    #[test]
    fn test_resolved_steps_explicit() {
        let job = Job::new("j1", "abc").with_steps(["tts-es"]);
        assert_eq!(job.resolved_steps().unwrap(), vec![Step::Tts(Lang::Es)]);
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let job = Job::new("j1", "abc").with_status(JobStatus::Running);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["videoId"], "abc");
        assert_eq!(json["status"], "running");
        assert!(json["currentStep"].is_null());
    }

    #[test]
    fn test_blank_video_id_is_missing() {
        let mut job = Job::new("j1", "  ");
        assert!(job.video_id().is_none());
        job.video_id = None;
        assert!(job.video_id().is_none());
    }
}
