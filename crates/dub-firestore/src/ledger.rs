//! Job ledger: the narrow surface the worker needs from the document store.

use async_trait::async_trait;
use tracing::info;

use dub_models::{Job, JobId, JobStatus, Step, VideoSummary};

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::repos::{JobRepository, VideoRepository};

/// Durable record of jobs and their per-video summaries.
///
/// Each method is a single atomic write (or a single query) on the backing store.
#[async_trait]
pub trait JobLedger: Send + Sync {
    async fn find_by_status(&self, status: JobStatus, limit: u32) -> FirestoreResult<Vec<Job>>;

    /// Append a line to the job log and refresh `updatedAt`.
    async fn append_log(&self, job_id: &JobId, message: &str) -> FirestoreResult<()>;

    /// Set status, optionally `currentStep`, and refresh `updatedAt`.
    async fn set_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        current_step: Option<&str>,
    ) -> FirestoreResult<()>;

    async fn record_steps(&self, job_id: &JobId, steps: &[Step]) -> FirestoreResult<()>;

    /// Merge a summary into the video's document.
    async fn upsert_video(&self, summary: &VideoSummary) -> FirestoreResult<()>;

    /// Conditionally move a job to `running` for `owner`. `false` means it was lost.
    async fn try_claim(&self, job: &Job, owner: &str) -> FirestoreResult<bool>;
}

/// [`JobLedger`] over Firestore, with transport retries on every call.
#[derive(Clone)]
pub struct FirestoreLedger {
    client: FirestoreClient,
    jobs: JobRepository,
    videos: VideoRepository,
}

impl FirestoreLedger {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            jobs: JobRepository::new(client.clone()),
            videos: VideoRepository::new(client.clone()),
            client,
        }
    }

    pub async fn from_env() -> FirestoreResult<Self> {
        let client = FirestoreClient::from_env().await?;
        info!(emulator = client.is_emulator(), "Firestore ledger ready");
        Ok(Self::new(client))
    }
}

#[async_trait]
impl JobLedger for FirestoreLedger {
    async fn find_by_status(&self, status: JobStatus, limit: u32) -> FirestoreResult<Vec<Job>> {
        self.client
            .with_retry("find_jobs", || self.jobs.find_by_status(status, limit))
            .await
    }

    async fn append_log(&self, job_id: &JobId, message: &str) -> FirestoreResult<()> {
        self.client
            .with_retry("append_log", || self.jobs.append_log(job_id, message))
            .await
    }

    async fn set_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        current_step: Option<&str>,
    ) -> FirestoreResult<()> {
        self.client
            .with_retry("set_status", || self.jobs.set_status(job_id, status, current_step))
            .await
    }

    async fn record_steps(&self, job_id: &JobId, steps: &[Step]) -> FirestoreResult<()> {
        let names: Vec<String> = steps.iter().map(Step::name).collect();
        self.client
            .with_retry("record_steps", || self.jobs.set_steps(job_id, &names))
            .await
    }

    async fn upsert_video(&self, summary: &VideoSummary) -> FirestoreResult<()> {
        self.client
            .with_retry("upsert_video", || self.videos.upsert_summary(summary))
            .await
    }

    async fn try_claim(&self, job: &Job, owner: &str) -> FirestoreResult<bool> {
        // A claim is a conditional write; retrying it after a lost race would
        // only fail the precondition again.
        self.jobs.try_claim(job, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FirestoreConfig;
    use crate::retry::RetryConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

    async fn ledger_for(server: &MockServer) -> FirestoreLedger {
        let mut config = FirestoreConfig::emulator("demo", server.address().to_string());
        config.retry = RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
        };
        FirestoreLedger::new(FirestoreClient::new(config).await.unwrap())
    }

    #[tokio::test]
    async fn test_append_log_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:commit", DOCS)))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}:commit", DOCS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = ledger_for(&server).await;
        ledger
            .append_log(&JobId::from("job-1"), "[2024-05-01T10:00:00Z] Downloading audio")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_steps_writes_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:commit", DOCS)))
            .and(body_partial_json(json!({"writes": [{
                "update": {"fields": {"steps": {"arrayValue": {"values": [
                    {"stringValue": "transcribe"},
                    {"stringValue": "translate-en"}
                ]}}}},
                "updateMask": {"fieldPaths": ["steps"]}
            }]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = ledger_for(&server).await;
        ledger
            .record_steps(
                &JobId::from("job-1"),
                &[Step::Transcribe, Step::Translate(dub_models::Lang::En)],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_permission_denied_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let ledger = ledger_for(&server).await;
        let err = ledger
            .set_status(&JobId::from("job-1"), JobStatus::Running, Some("ingest"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::FirestoreError::PermissionDenied(_)));
    }
}
