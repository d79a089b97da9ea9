//! Speech recognition through the whisper.cpp command line tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use dub_models::Segment;

use crate::command::run_tool;
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

/// Segment bounds in milliseconds.
#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

/// Runs `whisper-cli -oj` and reads back its JSON transcript.
#[derive(Debug, Clone)]
pub struct WhisperCli {
    config: MediaConfig,
}

impl WhisperCli {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    fn args(&self, wav: &Path, language: &str, output_prefix: &Path) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            self.config.whisper_model.to_string_lossy().to_string(),
            "-f".to_string(),
            wav.to_string_lossy().to_string(),
            "-l".to_string(),
            language.to_string(),
            "-oj".to_string(),
            "-of".to_string(),
            output_prefix.to_string_lossy().to_string(),
        ];
        if let Some(threads) = self.config.whisper_threads {
            args.push("-t".to_string());
            args.push(threads.to_string());
        }
        args
    }

    /// Transcribe `wav` spoken in `language`. Segment text is trimmed.
    pub async fn transcribe(&self, wav: &Path, language: &str) -> MediaResult<Vec<Segment>> {
        let whisper = self.config.whisper()?;
        if !self.config.whisper_model.exists() {
            return Err(MediaError::invalid_output(format!(
                "Whisper model not found: {}",
                self.config.whisper_model.display()
            )));
        }

        let prefix: PathBuf = wav.with_extension("");
        run_tool(&whisper, self.args(wav, language, &prefix)).await?;

        let json_path = prefix.with_extension("json");
        if !json_path.exists() {
            return Err(MediaError::MissingOutput(json_path));
        }
        let raw = tokio::fs::read_to_string(&json_path).await?;
        let segments = parse_whisper_json(&raw)?;

        info!(segments = segments.len(), language = %language, "Transcription finished");
        Ok(segments)
    }
}

/// Parse whisper.cpp JSON output into timed segments.
pub fn parse_whisper_json(raw: &str) -> MediaResult<Vec<Segment>> {
    let output: WhisperOutput = serde_json::from_str(raw)?;
    Ok(output
        .transcription
        .into_iter()
        .map(|s| {
            Segment::new(
                Duration::from_millis(s.offsets.from),
                Duration::from_millis(s.offsets.to),
                s.text.trim(),
            )
        })
        .collect())
}
