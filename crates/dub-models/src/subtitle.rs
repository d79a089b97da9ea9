//! SRT subtitle documents.
//!
//! A document is a sequence of cues serialized as
//! `index\nSTART --> END\ntext...\n\n` with `HH:MM:SS,mmm` timecodes.
//! Line classification ([`LineKind`]) is what lets translation touch text
//! lines only, leaving index, timecode and blank lines byte-identical.

use std::time::Duration;

/// Transcribed speech span, as produced by a speech-to-text engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl Segment {
    pub fn new(start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// One caption entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// 1-based position in the document.
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleDocument {
    cues: Vec<Cue>,
}

impl SubtitleDocument {
    /// Build a document from engine segments, numbering cues from 1.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let cues = segments
            .into_iter()
            .enumerate()
            .map(|(i, seg)| Cue {
                index: i + 1,
                start: seg.start,
                end: seg.end,
                lines: vec![seg.text.trim().to_string()],
            })
            .collect();
        Self { cues }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn to_srt(&self) -> String {
        let mut out = String::new();
        for cue in &self.cues {
            out.push_str(&cue.index.to_string());
            out.push('\n');
            out.push_str(&format_timestamp(cue.start));
            out.push_str(" --> ");
            out.push_str(&format_timestamp(cue.end));
            out.push('\n');
            out.push_str(&cue.lines.join("\n"));
            out.push_str("\n\n");
        }
        out
    }
}

/// Format a duration as an SRT timecode (`HH:MM:SS,mmm`).
pub fn format_timestamp(at: Duration) -> String {
    let total_ms = at.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Role of a single line inside an SRT document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Purely numeric after trimming.
    Index,
    /// Contains the `-->` arrow.
    Timecode,
    /// Empty after trimming.
    Blank,
    /// Caption text.
    Text,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            LineKind::Index
        } else if trimmed.contains("-->") {
            LineKind::Timecode
        } else if trimmed.is_empty() {
            LineKind::Blank
        } else {
            LineKind::Text
        }
    }

    /// Lines that must be carried through translation unchanged.
    pub fn is_structural(&self) -> bool {
        !matches!(self, LineKind::Text)
    }
}

/// Caption text only: every text line trimmed, joined with `\n`.
pub fn plain_text(srt: &str) -> String {
    srt.lines()
        .filter(|line| LineKind::classify(line) == LineKind::Text)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}
