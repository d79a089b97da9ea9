//! ElevenLabs speech synthesis and the silent placeholder.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use dub_media::{write_silent_mp3, MediaConfig, PLACEHOLDER_SECONDS};
use dub_models::Lang;

use super::{ServiceError, ServiceResult, SpeechSynthesizer};
use crate::config::TtsConfig;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

pub struct ElevenLabsSynthesizer {
    http: Client,
    api_key: String,
    voice_id: String,
    model_id: String,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: String, config: &TtsConfig) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("dub-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_key,
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format=mp3_44100",
            self.base_url,
            urlencoding::encode(&self.voice_id)
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn provider(&self) -> &str {
        "elevenlabs"
    }

    fn is_live(&self) -> bool {
        true
    }

    /// The model is multilingual; `lang` only labels the request in logs.
    async fn synthesize(&self, text: &str, lang: Lang) -> ServiceResult<Vec<u8>> {
        debug!(lang = %lang, chars = text.len(), voice = %self.voice_id, "ElevenLabs request");

        let response = self
            .http
            .post(self.endpoint())
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Provider {
                provider: "elevenlabs",
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ServiceError::invalid_response("elevenlabs", "empty audio body"));
        }
        Ok(bytes.to_vec())
    }
}

/// Produces a short silent MP3 regardless of the text.
pub struct SilentSynthesizer {
    media: MediaConfig,
}

impl SilentSynthesizer {
    pub fn new(media: MediaConfig) -> Self {
        Self { media }
    }
}

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    fn provider(&self) -> &str {
        "silent"
    }

    fn is_live(&self) -> bool {
        false
    }

    async fn synthesize(&self, _text: &str, _lang: Lang) -> ServiceResult<Vec<u8>> {
        let scratch = tempfile::tempdir().map_err(dub_media::MediaError::from)?;
        let out = scratch.path().join("silence.mp3");
        write_silent_mp3(&self.media, &out, PLACEHOLDER_SECONDS).await?;
        let bytes = tokio::fs::read(&out).await.map_err(dub_media::MediaError::from)?;
        Ok(bytes)
    }
}
