//! Artifact storage.
//!
//! This crate provides:
//! - The [`ArtifactStore`] contract used by the pipeline (exists / upload / download)
//! - A GCS backend speaking the S3 interoperability API
//! - A Firebase Storage emulator backend for local development
//! - One-time backend selection from the environment

pub mod config;
pub mod emulator;
pub mod error;
pub mod gcs;
pub mod store;

use std::sync::Arc;

pub use config::{GcsConfig, StorageBackend, StorageConfig};
pub use emulator::EmulatorStore;
pub use error::{StorageError, StorageResult};
pub use gcs::GcsStore;
pub use store::{content_type_for, ArtifactStore};

/// Build the store selected by `config`.
pub async fn connect(config: StorageConfig) -> StorageResult<Arc<dyn ArtifactStore>> {
    let store: Arc<dyn ArtifactStore> = match config.backend {
        StorageBackend::Emulator { host } => Arc::new(EmulatorStore::new(host, config.bucket)?),
        StorageBackend::Gcs(gcs) => Arc::new(GcsStore::new(gcs, config.bucket).await?),
    };
    tracing::info!(backend = store.backend_name(), "Artifact store ready");
    Ok(store)
}
