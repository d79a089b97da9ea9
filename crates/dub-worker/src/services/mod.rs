//! External service adapters.
//!
//! Each adapter is constructed once at start-up and shared by every job.
//! Translators and synthesizers report whether they are backed by a live
//! credential; when they are not, the pipeline degrades instead of failing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use dub_media::{MediaConfig, MediaError};
use dub_models::{Lang, Segment};

use crate::config::{TranslateConfig, TtsConfig};

pub mod audio;
pub mod deepl;
pub mod elevenlabs;
pub mod whisper;

pub use audio::YtDlpAudioSource;
pub use deepl::{DeepLTranslator, PassthroughTranslator};
pub use elevenlabs::{ElevenLabsSynthesizer, SilentSynthesizer};
pub use whisper::WhisperTranscriber;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{provider} returned {status}: {message}")]
    Provider {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid {provider} response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl ServiceError {
    pub fn invalid_response(provider: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }
}

/// Fetches a video's audio as 16 kHz mono WAV.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Download audio for `video_id` into `dir`, returning the WAV path.
    async fn fetch_wav(&self, video_id: &str, dir: &Path) -> ServiceResult<PathBuf>;
}

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, wav: &Path, lang: Lang) -> ServiceResult<Vec<Segment>>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    fn provider(&self) -> &str;

    /// `false` when no credential is configured and output would be identity.
    fn is_live(&self) -> bool;

    async fn translate(&self, text: &str, target: Lang) -> ServiceResult<String>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn provider(&self) -> &str;

    fn is_live(&self) -> bool;

    /// Synthesize `text` in `lang`, returning encoded MP3 bytes.
    async fn synthesize(&self, text: &str, lang: Lang) -> ServiceResult<Vec<u8>>;
}

/// Build the translator selected by `config`.
///
/// A missing credential or an unsupported provider yields the passthrough translator.
pub fn translator_from_config(config: &TranslateConfig) -> ServiceResult<Arc<dyn Translator>> {
    let Some(key) = config.api_key.clone() else {
        warn!("TRANSLATE_API_KEY not set; subtitles will be copied untranslated");
        return Ok(Arc::new(PassthroughTranslator));
    };

    match config.provider.as_str() {
        "deepl" => {
            info!(provider = "deepl", "Translation enabled");
            Ok(Arc::new(DeepLTranslator::new(
                key,
                config.deepl_url.clone(),
                config.timeout,
            )?))
        }
        other => {
            warn!(provider = %other, "Unsupported translation provider; subtitles will be copied untranslated");
            Ok(Arc::new(PassthroughTranslator))
        }
    }
}

/// Build the synthesizer selected by `config`.
pub fn synthesizer_from_config(
    config: &TtsConfig,
    media: &MediaConfig,
) -> ServiceResult<Arc<dyn SpeechSynthesizer>> {
    let silent = || -> Arc<dyn SpeechSynthesizer> { Arc::new(SilentSynthesizer::new(media.clone())) };

    if !config.enabled {
        info!("TTS disabled; dubs will be silent placeholders");
        return Ok(silent());
    }
    let Some(key) = config.api_key.clone() else {
        warn!("TTS_ENABLED is set but TTS_API_KEY is missing; dubs will be silent placeholders");
        return Ok(silent());
    };

    match config.provider.as_str() {
        "eleven" | "elevenlabs" => {
            info!(provider = "elevenlabs", voice = %config.voice_id, "Speech synthesis enabled");
            Ok(Arc::new(ElevenLabsSynthesizer::new(key, config)?))
        }
        other => {
            warn!(provider = %other, "Unsupported TTS provider; dubs will be silent placeholders");
            Ok(silent())
        }
    }
}
