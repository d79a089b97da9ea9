//! Storage backend selection.

use crate::error::{StorageError, StorageResult};

/// Default GCS endpoint for the S3 interoperability API.
pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Credentials and endpoint for the GCS backend.
#[derive(Debug, Clone)]
pub struct GcsConfig {
    pub endpoint_url: String,
    /// HMAC access key id (GCS interoperability key).
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Gcs(GcsConfig),
    /// Firebase Storage emulator at `host` (`host:port`, optionally with scheme).
    Emulator { host: String },
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub backend: StorageBackend,
}

impl StorageConfig {
    /// Create config from environment variables.
    ///
    /// `FIREBASE_STORAGE_EMULATOR_HOST` selects the emulator; otherwise the
    /// GCS HMAC credentials are required.
    pub fn from_env() -> StorageResult<Self> {
        let bucket = non_empty_var("FIREBASE_STORAGE_BUCKET")
            .ok_or_else(|| StorageError::config_error("FIREBASE_STORAGE_BUCKET not set"))?;

        let backend = match non_empty_var("FIREBASE_STORAGE_EMULATOR_HOST") {
            Some(host) => StorageBackend::Emulator { host },
            None => StorageBackend::Gcs(GcsConfig {
                endpoint_url: non_empty_var("GCS_ENDPOINT_URL")
                    .unwrap_or_else(|| DEFAULT_GCS_ENDPOINT.to_string()),
                access_key_id: non_empty_var("GCS_HMAC_ACCESS_KEY_ID")
                    .ok_or_else(|| StorageError::config_error("GCS_HMAC_ACCESS_KEY_ID not set"))?,
                secret_access_key: non_empty_var("GCS_HMAC_SECRET")
                    .ok_or_else(|| StorageError::config_error("GCS_HMAC_SECRET not set"))?,
                region: non_empty_var("GCS_REGION").unwrap_or_else(|| "auto".to_string()),
            }),
        };

        Ok(Self { bucket, backend })
    }

    pub fn is_emulator(&self) -> bool {
        matches!(self.backend, StorageBackend::Emulator { .. })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
