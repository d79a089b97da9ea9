//! Job selection and the worker loop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio_test::assert_ok;

use common::{Harness, MemoryLedger, MemoryStore};
use dub_models::{Job, JobStatus};
use dub_worker::{ClaimPolicy, JobSelector, Worker};

fn policy(owner: &str) -> ClaimPolicy {
    ClaimPolicy {
        owner: owner.to_string(),
        running_scan_limit: 10,
        claim_lease: Duration::from_secs(1800),
    }
}

fn claimed(id: &str, owner: &str) -> Job {
    let mut job = Job::new(id, "vid").with_status(JobStatus::Running);
    job.claimed_by = Some(owner.to_string());
    job.updated_at = Some(Utc::now());
    job
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_running_job_is_preferred_over_queued() {
    let ledger = MemoryLedger::default()
        .with_job(Job::new("a-queued", "vid"))
        .with_job(Job::new("b-running", "vid").with_status(JobStatus::Running));

    let job = JobSelector::new(Arc::new(ledger)).next_job().await.unwrap();

    assert_eq!(job.unwrap().id.as_str(), "b-running");
}

#[tokio::test]
async fn test_queued_job_is_selected_when_nothing_runs() {
    let ledger = MemoryLedger::default()
        .with_job(Job::new("a-done", "vid").with_status(JobStatus::Done))
        .with_job(Job::new("b-queued", "vid"));

    let job = JobSelector::new(Arc::new(ledger)).next_job().await.unwrap();

    assert_eq!(job.unwrap().id.as_str(), "b-queued");
}

#[tokio::test]
async fn test_no_job_when_ledger_idle() {
    let ledger = MemoryLedger::default()
        .with_job(Job::new("a", "vid").with_status(JobStatus::Failed));

    let job = JobSelector::new(Arc::new(ledger)).next_job().await.unwrap();

    assert!(job.is_none());
}

#[tokio::test]
async fn test_claim_marks_queued_job_running() {
    let ledger = Arc::new(MemoryLedger::default().with_job(Job::new("q", "vid")));
    let selector = JobSelector::with_claim(ledger.clone(), policy("worker-a"));

    let job = selector.next_job().await.unwrap().unwrap();

    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.claimed_by.as_deref(), Some("worker-a"));
    assert_eq!(ledger.job("q").claimed_by.as_deref(), Some("worker-a"));
}

#[tokio::test]
async fn test_lost_claim_yields_no_job() {
    let ledger = MemoryLedger::contended().with_job(Job::new("q", "vid"));

    let job = JobSelector::with_claim(Arc::new(ledger), policy("worker-a"))
        .next_job()
        .await
        .unwrap();

    assert!(job.is_none());
}

#[tokio::test]
async fn test_claiming_worker_resumes_only_its_own_running_jobs() {
    let ledger = Arc::new(
        MemoryLedger::default()
            .with_job(claimed("a-other", "worker-b"))
            .with_job(claimed("b-mine", "worker-a")),
    );

    let mine = JobSelector::with_claim(ledger.clone(), policy("worker-a"))
        .next_job()
        .await
        .unwrap();
    assert_eq!(mine.unwrap().id.as_str(), "b-mine");

    let other = JobSelector::with_claim(ledger, policy("worker-c"))
        .next_job()
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_unclaimed_running_job_is_resumable_by_anyone() {
    let ledger = MemoryLedger::default()
        .with_job(Job::new("legacy", "vid").with_status(JobStatus::Running));

    let job = JobSelector::with_claim(Arc::new(ledger), policy("worker-a"))
        .next_job()
        .await
        .unwrap();

    assert_eq!(job.unwrap().id.as_str(), "legacy");
}

#[tokio::test]
async fn test_abandoned_claim_is_taken_over_after_lease() {
    let mut stale = claimed("a-stale", "worker-gone");
    stale.updated_at = Some(Utc::now() - chrono::Duration::hours(2));
    let ledger = MemoryLedger::default()
        .with_job(stale)
        .with_job(Job::new("b-queued", "vid"));

    let job = JobSelector::with_claim(Arc::new(ledger), policy("worker-a"))
        .next_job()
        .await
        .unwrap();

    assert_eq!(job.unwrap().id.as_str(), "a-stale");
}

#[tokio::test]
async fn test_live_claim_of_another_worker_is_left_alone() {
    let ledger = Arc::new(
        MemoryLedger::default()
            .with_job(claimed("a-busy", "worker-b"))
            .with_job(Job::new("b-queued", "vid")),
    );

    let job = JobSelector::with_claim(ledger.clone(), policy("worker-a"))
        .next_job()
        .await
        .unwrap();

    assert_eq!(job.unwrap().id.as_str(), "b-queued");
    assert_eq!(ledger.job("a-busy").claimed_by.as_deref(), Some("worker-b"));
}

#[tokio::test]
async fn test_restarted_worker_without_fixed_id_recovers_its_crashed_job() {
    let mut crashed = claimed("a-crashed", &format!("worker-{}", uuid::Uuid::new_v4()));
    crashed.updated_at = Some(Utc::now() - chrono::Duration::minutes(31));
    let ledger = MemoryLedger::default().with_job(crashed);

    let restarted = ClaimPolicy {
        owner: format!("worker-{}", uuid::Uuid::new_v4()),
        ..policy("unused")
    };
    let job = JobSelector::with_claim(Arc::new(ledger), restarted)
        .next_job()
        .await
        .unwrap();

    assert_eq!(job.unwrap().id.as_str(), "a-crashed");
}

// ============================================================================
// Worker loop
// ============================================================================

fn worker(h: &Harness, poll: Duration) -> Worker {
    Worker::new(JobSelector::new(h.ledger.clone()), h.executor(), poll)
}

#[tokio::test]
async fn test_run_once_processes_one_job_then_idles() {
    let h = Harness::new(
        MemoryStore::default(),
        MemoryLedger::default().with_job(Job::new("job-1", "abc123")),
    );
    let w = worker(&h, Duration::from_secs(3));

    assert!(assert_ok!(w.run_once().await));
    assert_eq!(h.ledger.job("job-1").status, JobStatus::Done);
    assert!(!assert_ok!(w.run_once().await));
}

#[tokio::test]
async fn test_failed_job_does_not_stop_the_worker() {
    let h = Harness::new(
        MemoryStore::default(),
        MemoryLedger::default()
            .with_job(Job::new("a-bad", "abc123").with_steps(["dance"]))
            .with_job(Job::new("b-good", "abc123")),
    );
    let w = worker(&h, Duration::from_secs(3));

    assert!(assert_ok!(w.run_once().await));
    assert!(assert_ok!(w.run_once().await));

    assert_eq!(h.ledger.job("a-bad").status, JobStatus::Failed);
    assert_eq!(h.ledger.job("b-good").status, JobStatus::Done);
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let h = Harness::new(
        MemoryStore::default(),
        MemoryLedger::default().with_job(Job::new("job-1", "abc123")),
    );
    let ledger = h.ledger.clone();
    let w = worker(&h, Duration::from_millis(20));
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(async move { w.run(rx).await });

    tokio::time::timeout(Duration::from_secs(5), async {
        while ledger.job("job-1").status != JobStatus::Done {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job was not processed");

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_run_returns_immediately_when_already_shut_down() {
    let h = Harness::new(MemoryStore::default(), MemoryLedger::default());
    let w = worker(&h, Duration::from_secs(60));
    let (_tx, rx) = watch::channel(true);

    let stopped = tokio::time::timeout(Duration::from_secs(1), w.run(rx)).await;
    assert_ok!(assert_ok!(stopped));
}
