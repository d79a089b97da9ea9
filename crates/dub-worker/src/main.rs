//! Media localization worker binary.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dub_firestore::{FirestoreLedger, JobLedger};
use dub_media::MediaConfig;
use dub_storage::StorageConfig;
use dub_worker::services::{
    synthesizer_from_config, translator_from_config, WhisperTranscriber, YtDlpAudioSource,
};
use dub_worker::{
    metrics, ClaimPolicy, JobSelector, PipelineContext, PipelineExecutor, TranslateConfig,
    TtsConfig, Worker, WorkerConfig, WorkerResult,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("dub=info".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("aws_smithy_runtime=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting dub-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let worker = match build_worker(&config).await {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to start worker: {}", e);
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal; finishing current job");
        shutdown_tx.send(true).ok();
    });

    if let Err(e) = worker.run(shutdown_rx).await {
        error!("Worker error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

async fn build_worker(config: &WorkerConfig) -> WorkerResult<Worker> {
    metrics::init_metrics(config.metrics_port)?;

    let store = dub_storage::connect(StorageConfig::from_env()?).await?;
    let ledger: Arc<dyn JobLedger> = Arc::new(FirestoreLedger::from_env().await?);

    let media = MediaConfig::from_env();
    let translator = translator_from_config(&TranslateConfig::from_env())?;
    let synthesizer = synthesizer_from_config(&TtsConfig::from_env(), &media)?;

    let ctx = PipelineContext {
        store,
        ledger: Arc::clone(&ledger),
        audio: Arc::new(YtDlpAudioSource::new(media.clone())),
        transcriber: Arc::new(WhisperTranscriber::new(media)),
        translator,
        synthesizer,
        work_dir: config.work_dir.clone(),
    };

    let selector = if config.atomic_claim {
        info!(worker_id = %config.worker_id, "Atomic job claiming enabled");
        JobSelector::with_claim(
            ledger,
            ClaimPolicy {
                owner: config.worker_id.clone(),
                running_scan_limit: config.running_scan_limit,
                claim_lease: config.claim_lease,
            },
        )
    } else {
        JobSelector::new(ledger)
    };

    Ok(Worker::new(
        selector,
        PipelineExecutor::new(Arc::new(ctx)),
        config.poll_interval,
    ))
}
