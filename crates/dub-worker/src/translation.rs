//! Subtitle translation.
//!
//! Index, timecode and blank lines are copied byte-for-byte, line endings
//! included; only caption text goes through the translator.

use dub_models::{Lang, LineKind};

use crate::services::{ServiceResult, Translator};

/// Result of translating a subtitle document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Translated(String),
    /// No live translator; the text is the source copied verbatim.
    Degraded(String),
}

impl Translation {
    pub fn text(&self) -> &str {
        match self {
            Translation::Translated(t) | Translation::Degraded(t) => t,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Translation::Degraded(_))
    }
}

/// Translate the text lines of an SRT document into `target`.
pub async fn translate_srt(
    translator: &dyn Translator,
    srt: &str,
    target: Lang,
) -> ServiceResult<Translation> {
    if !translator.is_live() {
        return Ok(Translation::Degraded(srt.to_string()));
    }

    let mut out = String::with_capacity(srt.len());
    for raw in srt.split_inclusive('\n') {
        let (line, ending) = split_line_ending(raw);
        if LineKind::classify(line).is_structural() {
            out.push_str(raw);
        } else {
            out.push_str(&translator.translate(line, target).await?);
            out.push_str(ending);
        }
    }
    Ok(Translation::Translated(out))
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(line) = raw.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = raw.strip_suffix('\n') {
        (line, "\n")
    } else {
        (raw, "")
    }
}
