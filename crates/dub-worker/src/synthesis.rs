//! Dubbed audio from translated subtitles.

use std::path::Path;

use dub_models::{plain_text, Lang};

use crate::error::WorkerResult;
use crate::services::SpeechSynthesizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesis {
    Spoken,
    /// Silent placeholder written instead of speech.
    Degraded,
}

/// Synthesize the caption text of `srt` in `lang` and write the MP3 to `out`.
pub async fn synthesize_dub(
    synthesizer: &dyn SpeechSynthesizer,
    srt: &str,
    lang: Lang,
    out: &Path,
) -> WorkerResult<Synthesis> {
    let text = plain_text(srt);
    let audio = synthesizer.synthesize(&text, lang).await?;
    tokio::fs::write(out, audio).await?;

    Ok(if synthesizer.is_live() {
        Synthesis::Spoken
    } else {
        Synthesis::Degraded
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        live: bool,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for Recorder {
        fn provider(&self) -> &str {
            "recorder"
        }

        fn is_live(&self) -> bool {
            self.live
        }

        async fn synthesize(&self, text: &str, _lang: Lang) -> ServiceResult<Vec<u8>> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(b"ID3audio".to_vec())
        }
    }

    #[tokio::test]
    async fn test_synthesizes_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("en.mp3");
        let synth = Recorder {
            live: true,
            seen: Mutex::new(Vec::new()),
        };

        let srt = "1\n00:00:00,000 --> 00:00:02,000\n  Hello world \n\n2\n00:00:02,000 --> 00:00:03,000\nBye\n\n";
        let outcome = synthesize_dub(&synth, srt, Lang::En, &out).await.unwrap();

        assert_eq!(outcome, Synthesis::Spoken);
        assert_eq!(synth.seen.lock().unwrap().as_slice(), ["Hello world\nBye"]);
        assert_eq!(std::fs::read(&out).unwrap(), b"ID3audio");
    }

    #[tokio::test]
    async fn test_placeholder_is_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("es.mp3");
        let synth = Recorder {
            live: false,
            seen: Mutex::new(Vec::new()),
        };

        let outcome = synthesize_dub(&synth, "1\n00:00:00,000 --> 00:00:01,000\nHola\n", Lang::Es, &out)
            .await
            .unwrap();
        assert_eq!(outcome, Synthesis::Degraded);
        assert!(out.exists());
    }
}
