//! Firebase Storage emulator backend.
//!
//! Talks the emulator's bare media protocol:
//! - `GET  /v0/b/{bucket}/o/{object}` for existence
//! - `POST /v0/b/{bucket}/o?uploadType=media&name={object}` for upload
//! - `GET  /v0/b/{bucket}/o/{object}?alt=media` for download
//!
//! Object names are percent-encoded, so `subs/abc/pt.srt` travels as
//! `subs%2Fabc%2Fpt.srt`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::{content_type_for, ensure_parent, ArtifactStore};

#[derive(Clone)]
pub struct EmulatorStore {
    http: Client,
    base_url: String,
    bucket: String,
}

impl EmulatorStore {
    /// `host` is `host:port`; a scheme may be given, `http://` is assumed otherwise.
    pub fn new(host: impl AsRef<str>, bucket: impl Into<String>) -> StorageResult<Self> {
        let host = host.as_ref().trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| StorageError::config_error(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            bucket: bucket.into(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/v0/b/{}/o/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl ArtifactStore for EmulatorStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let response = self.http.get(self.object_url(key)).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StorageError::ExistsFailed(format!(
                "{}: emulator returned {}",
                key, status
            ))),
        }
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        debug!("Uploading {} to emulator object {}", local_path.display(), key);

        let body = tokio::fs::read(local_path).await?;
        let url = format!(
            "{}/v0/b/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        );

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type_for(key))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(StorageError::upload_failed(format!(
                "{}: emulator returned {}: {}",
                key, status, text
            )));
        }

        info!("Uploaded {} to {}", local_path.display(), key);
        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        let url = format!("{}?alt=media", self.object_url(key));
        let response = self.http.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(StorageError::not_found(key)),
            status => {
                return Err(StorageError::download_failed(format!(
                    "{}: emulator returned {}",
                    key, status
                )))
            }
        }

        let bytes = response.bytes().await?;
        ensure_parent(local_path).await?;
        tokio::fs::write(local_path, &bytes).await?;

        info!("Downloaded {} to {}", key, local_path.display());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "firebase-emulator"
    }
}

// =============================================================================
// Tests
// =============================================================================
