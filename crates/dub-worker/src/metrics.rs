//! Worker metrics and the Prometheus exporter.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "dub_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "dub_jobs_failed_total";
    pub const STEPS_EXECUTED_TOTAL: &str = "dub_steps_executed_total";
    pub const STEPS_SKIPPED_TOTAL: &str = "dub_steps_skipped_total";
    pub const STEP_DURATION_SECONDS: &str = "dub_step_duration_seconds";
    pub const DEGRADED_OUTPUTS_TOTAL: &str = "dub_degraded_outputs_total";
    pub const IDLE_POLLS_TOTAL: &str = "dub_idle_polls_total";
}

/// Serve `/metrics` on `port` when set.
pub fn init_metrics(port: Option<u16>) -> WorkerResult<()> {
    let Some(port) = port else {
        return Ok(());
    };
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("Failed to start metrics exporter: {}", e)))?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_job_completed() {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
}

/// `reason` is `rejected`, `subprocess` or `error`.
pub fn record_job_failed(reason: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_step_executed(step: &str, duration_secs: f64) {
    let labels = [("step", step.to_string())];
    counter!(names::STEPS_EXECUTED_TOTAL, &labels).increment(1);
    histogram!(names::STEP_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_step_skipped(step: &str) {
    counter!(names::STEPS_SKIPPED_TOTAL, "step" => step.to_string()).increment(1);
}

/// `kind` is `translation` or `synthesis`.
pub fn record_degraded(kind: &'static str) {
    counter!(names::DEGRADED_OUTPUTS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_idle_poll() {
    counter!(names::IDLE_POLLS_TOTAL).increment(1);
}
