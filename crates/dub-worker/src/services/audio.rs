use std::path::{Path, PathBuf};

use async_trait::async_trait;

use dub_media::{fetch_audio, MediaConfig};

use super::{AudioSource, ServiceResult};

/// yt-dlp download followed by an ffmpeg transcode.
pub struct YtDlpAudioSource {
    config: MediaConfig,
}

impl YtDlpAudioSource {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AudioSource for YtDlpAudioSource {
    async fn fetch_wav(&self, video_id: &str, dir: &Path) -> ServiceResult<PathBuf> {
        Ok(fetch_audio(&self.config, video_id, dir).await?)
    }
}
