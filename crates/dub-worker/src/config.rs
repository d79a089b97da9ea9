//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Non-empty value of an environment variable.
fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between polls when no job is available
    pub poll_interval: Duration,
    /// Parent directory for per-job scratch directories
    pub work_dir: PathBuf,
    /// Claim queued jobs with a conditional write before running them
    pub atomic_claim: bool,
    /// Owner id written to `claimedBy`
    pub worker_id: String,
    /// Running jobs inspected per poll when claiming is enabled
    pub running_scan_limit: u32,
    /// Silence after which another worker's running job may be taken over
    pub claim_lease: Duration,
    /// Port for the Prometheus exporter; disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            work_dir: std::env::temp_dir().join("dub-worker"),
            atomic_claim: false,
            worker_id: format!("worker-{}", Uuid::new_v4()),
            running_scan_limit: 10,
            claim_lease: Duration::from_secs(1800),
            metrics_port: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: Duration::from_secs(
                env_parse("WORKER_POLL_INTERVAL_SECS").unwrap_or(3),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            atomic_claim: env_flag("WORKER_ATOMIC_CLAIM", false),
            worker_id: env_secret("WORKER_ID").unwrap_or(defaults.worker_id),
            running_scan_limit: env_parse("WORKER_RUNNING_SCAN_LIMIT")
                .unwrap_or(defaults.running_scan_limit)
                .max(1),
            claim_lease: env_parse("WORKER_CLAIM_LEASE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_lease),
            metrics_port: env_parse("METRICS_PORT"),
        }
    }
}

/// Translation provider settings.
#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub provider: String,
    pub api_key: Option<String>,
    pub deepl_url: String,
    pub timeout: Duration,
}

pub const DEFAULT_DEEPL_URL: &str = "https://api-free.deepl.com/v2/translate";

impl TranslateConfig {
    pub fn from_env() -> Self {
        Self {
            provider: std::env::var("TRANSLATE_PROVIDER")
                .map(|p| p.trim().to_lowercase())
                .unwrap_or_else(|_| "deepl".to_string()),
            api_key: env_secret("TRANSLATE_API_KEY"),
            deepl_url: std::env::var("DEEPL_API_URL")
                .unwrap_or_else(|_| DEFAULT_DEEPL_URL.to_string()),
            timeout: Duration::from_secs(env_parse("TRANSLATE_TIMEOUT_SECS").unwrap_or(60)),
        }
    }
}

/// Speech synthesis provider settings.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub enabled: bool,
    pub provider: String,
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub base_url: String,
    pub timeout: Duration,
}

pub const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io";

impl TtsConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_flag("TTS_ENABLED", false),
            provider: std::env::var("TTS_PROVIDER")
                .map(|p| p.trim().to_lowercase())
                .unwrap_or_else(|_| "eleven".to_string()),
            api_key: env_secret("TTS_API_KEY"),
            voice_id: env_secret("TTS_VOICE_ID").unwrap_or_else(|| "blast".to_string()),
            model_id: env_secret("TTS_MODEL_ID")
                .unwrap_or_else(|| "eleven_multilingual_v2".to_string()),
            base_url: std::env::var("ELEVENLABS_API_URL")
                .unwrap_or_else(|_| DEFAULT_ELEVENLABS_URL.to_string()),
            timeout: Duration::from_secs(env_parse("TTS_TIMEOUT_SECS").unwrap_or(120)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_worker_config_defaults() {
        for var in [
            "WORKER_POLL_INTERVAL_SECS",
            "WORKER_ATOMIC_CLAIM",
            "WORKER_ID",
            "WORKER_CLAIM_LEASE_SECS",
            "METRICS_PORT",
        ] {
            std::env::remove_var(var);
        }

        let config = WorkerConfig::from_env();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert!(!config.atomic_claim);
        assert!(config.worker_id.starts_with("worker-"));
        assert_eq!(config.claim_lease, Duration::from_secs(1800));
        assert_eq!(config.metrics_port, None);
    }

    #[test]
    #[serial]
    fn test_worker_config_overrides() {
        std::env::set_var("WORKER_POLL_INTERVAL_SECS", "7");
        std::env::set_var("WORKER_ATOMIC_CLAIM", "true");
        std::env::set_var("WORKER_ID", "worker-a");
        std::env::set_var("WORKER_CLAIM_LEASE_SECS", "60");
        std::env::set_var("METRICS_PORT", "nope");

        let config = WorkerConfig::from_env();
        assert_eq!(config.poll_interval, Duration::from_secs(7));
        assert!(config.atomic_claim);
        assert_eq!(config.worker_id, "worker-a");
        assert_eq!(config.claim_lease, Duration::from_secs(60));
        assert_eq!(config.metrics_port, None);

        std::env::remove_var("WORKER_POLL_INTERVAL_SECS");
        std::env::remove_var("WORKER_ATOMIC_CLAIM");
        std::env::remove_var("WORKER_ID");
        std::env::remove_var("WORKER_CLAIM_LEASE_SECS");
        std::env::remove_var("METRICS_PORT");
    }

    #[test]
    #[serial]
    fn test_provider_configs() {
        std::env::remove_var("TRANSLATE_PROVIDER");
        std::env::set_var("TRANSLATE_API_KEY", "  ");
        std::env::remove_var("TTS_ENABLED");
        std::env::remove_var("TTS_VOICE_ID");

        let translate = TranslateConfig::from_env();
        assert_eq!(translate.provider, "deepl");
        assert_eq!(translate.api_key, None);
        assert_eq!(translate.deepl_url, DEFAULT_DEEPL_URL);

        let tts = TtsConfig::from_env();
        assert!(!tts.enabled);
        assert_eq!(tts.provider, "eleven");
        assert_eq!(tts.voice_id, "blast");

        std::env::remove_var("TRANSLATE_API_KEY");
    }
}
