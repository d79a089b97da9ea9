//! DeepL translation, plus the identity fallback used without a credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use dub_models::Lang;

use super::{ServiceError, ServiceResult, Translator};

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// DeepL REST translator (`POST /v2/translate`, form encoded).
pub struct DeepLTranslator {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl DeepLTranslator {
    pub fn new(api_key: String, endpoint: String, timeout: Duration) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dub-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_key,
            endpoint,
        })
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    fn provider(&self) -> &str {
        "deepl"
    }

    fn is_live(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, target: Lang) -> ServiceResult<String> {
        let target_lang = target.code().to_uppercase();
        debug!(target = %target_lang, chars = text.len(), "DeepL request");

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&[("text", text), ("target_lang", target_lang.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Provider {
                provider: "deepl",
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: DeepLResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::invalid_response("deepl", e.to_string()))?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ServiceError::invalid_response("deepl", "empty translations list"))
    }
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    fn provider(&self) -> &str {
        "passthrough"
    }

    fn is_live(&self) -> bool {
        false
    }

    async fn translate(&self, text: &str, _target: Lang) -> ServiceResult<String> {
        Ok(text.to_string())
    }
}
