//! Job selection.
//!
//! Running jobs are picked before queued ones so that a job interrupted by a
//! crash is resumed before new work starts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use dub_firestore::JobLedger;
use dub_models::{Job, JobStatus};

use crate::error::WorkerResult;

/// Conditional-claim settings for running several workers against one ledger.
#[derive(Debug, Clone)]
pub struct ClaimPolicy {
    pub owner: String,
    /// Running jobs inspected when looking for one this worker may resume.
    pub running_scan_limit: u32,
    /// A running job claimed by another worker whose `updatedAt` is older
    /// than this is treated as abandoned and taken over.
    pub claim_lease: Duration,
}

impl ClaimPolicy {
    fn may_resume(&self, job: &Job) -> bool {
        let Some(owner) = job.claimed_by.as_deref() else {
            return true;
        };
        if owner == self.owner {
            return true;
        }
        match job.updated_at {
            Some(updated) => Utc::now()
                .signed_duration_since(updated)
                .to_std()
                .map_or(false, |age| age > self.claim_lease),
            None => true,
        }
    }
}

pub struct JobSelector {
    ledger: Arc<dyn JobLedger>,
    claim: Option<ClaimPolicy>,
}

impl JobSelector {
    /// Selector without claiming: a single worker per ledger.
    pub fn new(ledger: Arc<dyn JobLedger>) -> Self {
        Self {
            ledger,
            claim: None,
        }
    }

    pub fn with_claim(ledger: Arc<dyn JobLedger>, policy: ClaimPolicy) -> Self {
        Self {
            ledger,
            claim: Some(policy),
        }
    }

    /// At most one job to work on next.
    pub async fn next_job(&self) -> WorkerResult<Option<Job>> {
        match &self.claim {
            None => self.next_unclaimed().await,
            Some(policy) => self.next_claimed(policy).await,
        }
    }

    async fn next_unclaimed(&self) -> WorkerResult<Option<Job>> {
        if let Some(job) = self.first(JobStatus::Running, 1).await? {
            debug!(job_id = %job.id, "Resuming running job");
            return Ok(Some(job));
        }
        self.first(JobStatus::Queued, 1).await
    }

    async fn next_claimed(&self, policy: &ClaimPolicy) -> WorkerResult<Option<Job>> {
        let running = self
            .ledger
            .find_by_status(JobStatus::Running, policy.running_scan_limit)
            .await?;
        if let Some(job) = running.into_iter().find(|job| policy.may_resume(job)) {
            match job.claimed_by.as_deref() {
                Some(owner) if owner != policy.owner => {
                    info!(job_id = %job.id, stale_owner = owner, "Taking over abandoned job");
                }
                _ => debug!(job_id = %job.id, "Resuming running job"),
            }
            return Ok(Some(job));
        }

        let Some(mut job) = self.first(JobStatus::Queued, 1).await? else {
            return Ok(None);
        };
        if !self.ledger.try_claim(&job, &policy.owner).await? {
            info!(job_id = %job.id, "Job claimed by another worker, skipping");
            return Ok(None);
        }

        job.status = JobStatus::Running;
        job.claimed_by = Some(policy.owner.clone());
        Ok(Some(job))
    }

    async fn first(&self, status: JobStatus, limit: u32) -> WorkerResult<Option<Job>> {
        let jobs = self.ledger.find_by_status(status, limit).await?;
        Ok(jobs.into_iter().next())
    }
}
