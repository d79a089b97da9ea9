//! Artifact store contract.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Path-addressed blob store holding pipeline artifacts.
///
/// `exists` is the idempotency check: a step whose output key exists is
/// treated as complete.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Whether an object is stored at `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Store the contents of `local_path` at `key`, replacing any previous object.
    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<()>;

    /// Fetch `key` into `local_path`, creating parent directories.
    /// Fails with [`crate::StorageError::NotFound`] when the object is absent.
    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()>;

    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;
}

/// MIME type for an artifact key, chosen by extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext) {
        Some("srt") => "application/x-subrip",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

pub(crate) async fn ensure_parent(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
