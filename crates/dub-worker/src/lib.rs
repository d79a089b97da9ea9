//! Media localization worker.
//!
//! Polls the job ledger, runs each job's steps against the artifact store
//! and records progress back on the job document.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod reporter;
pub mod scheduler;
pub mod services;
pub mod synthesis;
pub mod translation;
pub mod worker;

pub use config::{TranslateConfig, TtsConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use pipeline::{PipelineContext, PipelineExecutor};
pub use reporter::JobReporter;
pub use scheduler::{ClaimPolicy, JobSelector};
pub use worker::Worker;
