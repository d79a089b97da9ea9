//! Typed repositories for jobs and video summaries.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use dub_models::{Job, JobId, JobStatus, VideoSummary};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_claim_conflict;
use crate::types::{
    Document, DocumentMask, FieldTransform, Precondition, ToFirestoreValue, Value, Write,
};

pub const JOBS_COLLECTION: &str = "jobs";
pub const VIDEOS_COLLECTION: &str = "videos";

/// Repository for job documents.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Jobs currently in `status`, at most `limit` of them.
    pub async fn find_by_status(&self, status: JobStatus, limit: u32) -> FirestoreResult<Vec<Job>> {
        let query = crate::types::StructuredQuery::field_equals(
            JOBS_COLLECTION,
            "status",
            status.as_str().to_firestore_value(),
        )
        .limit(limit);

        let docs = self.client.run_query(None, query).await?;
        docs.iter().map(document_to_job).collect()
    }

    /// Append one entry to the job log and refresh `updatedAt`, atomically.
    pub async fn append_log(&self, job_id: &JobId, message: &str) -> FirestoreResult<()> {
        let write = self.job_write(
            job_id,
            HashMap::new(),
            Vec::new(),
            vec![
                FieldTransform::array_union("log", vec![message.to_firestore_value()]),
                FieldTransform::request_time("updatedAt"),
            ],
        );
        self.client.commit(vec![write]).await?;
        Ok(())
    }

    /// Set status (and optionally `currentStep`) with `updatedAt`, atomically.
    pub async fn set_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        current_step: Option<&str>,
    ) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        let mut mask = vec!["status".to_string()];
        fields.insert("status".to_string(), status.as_str().to_firestore_value());
        if let Some(step) = current_step {
            fields.insert("currentStep".to_string(), step.to_firestore_value());
            mask.push("currentStep".to_string());
        }

        let write = self.job_write(
            job_id,
            fields,
            mask,
            vec![FieldTransform::request_time("updatedAt")],
        );
        self.client.commit(vec![write]).await?;
        debug!(job_id = %job_id, status = %status, step = ?current_step, "Job status written");
        Ok(())
    }

    /// Persist the resolved step list.
    pub async fn set_steps(&self, job_id: &JobId, steps: &[String]) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("steps".to_string(), steps.to_vec().to_firestore_value());

        let write = self.job_write(
            job_id,
            fields,
            vec!["steps".to_string()],
            vec![FieldTransform::request_time("updatedAt")],
        );
        self.client.commit(vec![write]).await?;
        Ok(())
    }

    /// Move a job to `running` under `owner`, only if nobody touched it since it was read.
    ///
    /// Returns `false` when another writer got there first.
    pub async fn try_claim(&self, job: &Job, owner: &str) -> FirestoreResult<bool> {
        let Some(revision) = job.revision.as_deref() else {
            warn!(job_id = %job.id, "Job read without a revision; cannot claim");
            return Ok(false);
        };

        let mut fields = HashMap::new();
        fields.insert("status".to_string(), JobStatus::Running.as_str().to_firestore_value());
        fields.insert("claimedBy".to_string(), owner.to_firestore_value());
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());

        let result = self
            .client
            .update_document_with_precondition(
                JOBS_COLLECTION,
                job.id.as_str(),
                fields,
                Some(vec![
                    "status".to_string(),
                    "claimedBy".to_string(),
                    "updatedAt".to_string(),
                ]),
                revision,
            )
            .await;

        match result {
            Ok(_) => {
                info!(job_id = %job.id, owner = %owner, "Claimed job");
                Ok(true)
            }
            Err(e) if e.is_precondition_failed() => {
                record_claim_conflict();
                debug!(job_id = %job.id, "Claim lost to another worker");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn job_write(
        &self,
        job_id: &JobId,
        fields: HashMap<String, Value>,
        mask: Vec<String>,
        transforms: Vec<FieldTransform>,
    ) -> Write {
        Write {
            update: Some(Document::named(
                self.client.full_document_name(JOBS_COLLECTION, job_id.as_str()),
                fields,
            )),
            update_mask: Some(DocumentMask::new(mask)),
            update_transforms: Some(transforms),
            current_document: Some(Precondition::must_exist()),
        }
    }
}

/// Repository for per-video summary documents.
#[derive(Clone)]
pub struct VideoRepository {
    client: FirestoreClient,
}

impl VideoRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Merge a summary into `videos/{videoId}`, creating it if absent.
    ///
    /// Only `status` and the listed `langs.*` keys are written; other fields
    /// and other languages already on the document are left alone.
    pub async fn upsert_summary(&self, summary: &VideoSummary) -> FirestoreResult<()> {
        let (fields, mask) = summary_to_fields(summary);
        self.client
            .update_document(VIDEOS_COLLECTION, &summary.video_id, fields, Some(mask))
            .await?;
        info!(video_id = %summary.video_id, "Upserted video summary");
        Ok(())
    }
}

fn summary_to_fields(summary: &VideoSummary) -> (HashMap<String, Value>, Vec<String>) {
    let langs: HashMap<String, bool> = summary
        .langs
        .iter()
        .map(|(lang, ready)| (lang.code().to_string(), *ready))
        .collect();

    let mut mask = vec!["status".to_string()];
    mask.extend(summary.langs.keys().map(|lang| format!("langs.{}", lang.code())));

    let mut fields = HashMap::new();
    fields.insert("status".to_string(), summary.status.as_str().to_firestore_value());
    fields.insert("langs".to_string(), langs.to_firestore_value());
    (fields, mask)
}

/// Decode a `jobs` document.
pub fn document_to_job(doc: &Document) -> FirestoreResult<Job> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_response("Job document has no name"))?;

    let status_raw: String = doc
        .field("status")
        .ok_or_else(|| FirestoreError::invalid_response(format!("Job {} has no status", id)))?;
    let status: JobStatus = status_raw
        .parse()
        .map_err(|e| FirestoreError::invalid_response(format!("Job {}: {}", id, e)))?;

    Ok(Job {
        id: JobId::from_string(id),
        video_id: doc.field("videoId"),
        status,
        steps: doc.field("steps"),
        current_step: doc.field("currentStep"),
        log: doc.field("log").unwrap_or_default(),
        updated_at: doc.field("updatedAt"),
        claimed_by: doc.field("claimedBy"),
        revision: doc.update_time.clone(),
    })
}
