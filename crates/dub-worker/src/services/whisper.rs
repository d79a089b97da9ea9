use std::path::Path;

use async_trait::async_trait;

use dub_media::{MediaConfig, WhisperCli};
use dub_models::{Lang, Segment};

use super::{ServiceResult, Transcriber};

/// Local whisper.cpp transcription.
pub struct WhisperTranscriber {
    cli: WhisperCli,
}

impl WhisperTranscriber {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            cli: WhisperCli::new(config),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, wav: &Path, lang: Lang) -> ServiceResult<Vec<Segment>> {
        Ok(self.cli.transcribe(wav, lang.code()).await?)
    }
}
