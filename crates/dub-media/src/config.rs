//! Tool locations.

use std::path::PathBuf;

use crate::error::{MediaError, MediaResult};

/// Binaries and models the media wrappers invoke.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub whisper_bin: String,
    /// ggml model file passed to the whisper CLI.
    pub whisper_model: PathBuf,
    pub whisper_threads: Option<u32>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            whisper_bin: "whisper-cli".to_string(),
            whisper_model: PathBuf::from("models/ggml-small.bin"),
            whisper_threads: None,
        }
    }
}

impl MediaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ytdlp_bin: std::env::var("YTDLP_BIN").unwrap_or(defaults.ytdlp_bin),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            whisper_bin: std::env::var("WHISPER_BIN").unwrap_or(defaults.whisper_bin),
            whisper_model: std::env::var("WHISPER_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.whisper_model),
            whisper_threads: std::env::var("WHISPER_THREADS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    pub fn ffmpeg(&self) -> MediaResult<PathBuf> {
        which::which(&self.ffmpeg_bin).map_err(|_| MediaError::FfmpegNotFound)
    }

    pub fn ytdlp(&self) -> MediaResult<PathBuf> {
        which::which(&self.ytdlp_bin).map_err(|_| MediaError::YtDlpNotFound)
    }

    pub fn whisper(&self) -> MediaResult<PathBuf> {
        which::which(&self.whisper_bin).map_err(|_| MediaError::ToolNotFound(self.whisper_bin.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("WHISPER_BIN", "/opt/whisper/main");
        std::env::set_var("WHISPER_MODEL", "/models/ggml-medium.bin");
        std::env::set_var("WHISPER_THREADS", "not-a-number");
        std::env::remove_var("FFMPEG_BIN");

        let config = MediaConfig::from_env();
        assert_eq!(config.whisper_bin, "/opt/whisper/main");
        assert_eq!(config.whisper_model, PathBuf::from("/models/ggml-medium.bin"));
        assert_eq!(config.whisper_threads, None);
        assert_eq!(config.ffmpeg_bin, "ffmpeg");

        std::env::remove_var("WHISPER_BIN");
        std::env::remove_var("WHISPER_MODEL");
        std::env::remove_var("WHISPER_THREADS");
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let config = MediaConfig {
            whisper_bin: "definitely-not-a-real-whisper-binary".to_string(),
            ..MediaConfig::default()
        };
        assert!(matches!(config.whisper(), Err(MediaError::ToolNotFound(_))));
    }
}
