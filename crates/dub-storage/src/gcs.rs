//! GCS backend over the S3 interoperability API.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::config::GcsConfig;
use crate::error::{StorageError, StorageResult};
use crate::store::{content_type_for, ensure_parent, ArtifactStore};

/// Production artifact store.
#[derive(Clone)]
pub struct GcsStore {
    client: Client,
    bucket: String,
}

impl GcsStore {
    pub async fn new(config: GcsConfig, bucket: impl Into<String>) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "gcs-hmac",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: bucket.into(),
        })
    }
}

#[async_trait]
impl ArtifactStore for GcsStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if not_found || e.to_string().contains("NotFound") {
                    Ok(false)
                } else {
                    Err(StorageError::ExistsFailed(format!("{}: {}", key, e)))
                }
            }
        }
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        debug!("Uploading {} to {}", local_path.display(), key);

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(key))
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", key, e)))?;

        info!("Uploaded {} to {}", local_path.display(), key);
        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        debug!("Downloading {} to {}", key, local_path.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    StorageError::not_found(key)
                } else {
                    StorageError::download_failed(format!("{}: {}", key, e))
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes();

        ensure_parent(local_path).await?;
        tokio::fs::write(local_path, &bytes).await?;

        info!("Downloaded {} to {}", key, local_path.display());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "gcs"
    }
}
