//! Worker loop: select, execute, repeat.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::error::WorkerResult;
use crate::metrics;
use crate::pipeline::PipelineExecutor;
use crate::scheduler::JobSelector;

/// Processes one job at a time; the next poll happens only after the
/// current job reaches a terminal status.
pub struct Worker {
    selector: JobSelector,
    executor: PipelineExecutor,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(selector: JobSelector, executor: PipelineExecutor, poll_interval: Duration) -> Self {
        Self {
            selector,
            executor,
            poll_interval,
        }
    }

    /// One selection cycle. Returns `true` if a job was executed.
    pub async fn run_once(&self) -> WorkerResult<bool> {
        let Some(job) = self.selector.next_job().await? else {
            return Ok(false);
        };

        info!(job_id = %job.id, status = %job.status, "Picked job");
        let outcome = self.executor.execute(&job).await?;
        info!(job_id = %job.id, outcome = %outcome, "Job finished");
        Ok(true)
    }

    /// Run until `shutdown` turns true.
    ///
    /// Shutdown is observed between jobs and during idle sleep; a job in
    /// progress always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        info!(poll_interval_secs = self.poll_interval.as_secs(), "Worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let worked = match self.run_once().await {
                Ok(worked) => worked,
                Err(e) => {
                    error!("Worker cycle failed: {}", e);
                    false
                }
            };
            if worked {
                continue;
            }

            metrics::record_idle_poll();
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Worker stopped");
        Ok(())
    }
}
