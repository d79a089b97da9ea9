//! Canonical artifact locations.
//!
//! An artifact's presence at its canonical path is the completion marker for
//! the step that produces it, so these paths must stay stable across releases.

use std::fmt;

use crate::lang::Lang;

/// Kind of stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// SRT subtitles.
    Subs,
    /// Dubbed MP3 audio.
    Dubs,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Subs => "subs",
            ArtifactKind::Dubs => "dubs",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Subs => "srt",
            ArtifactKind::Dubs => "mp3",
        }
    }
}

/// Deterministic location of one artifact in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPath {
    pub kind: ArtifactKind,
    pub video_id: String,
    pub lang: Lang,
}

impl ArtifactPath {
    pub fn new(kind: ArtifactKind, video_id: impl Into<String>, lang: Lang) -> Self {
        Self {
            kind,
            video_id: video_id.into(),
            lang,
        }
    }

    pub fn subs(video_id: impl Into<String>, lang: Lang) -> Self {
        Self::new(ArtifactKind::Subs, video_id, lang)
    }

    pub fn dubs(video_id: impl Into<String>, lang: Lang) -> Self {
        Self::new(ArtifactKind::Dubs, video_id, lang)
    }

    /// Object key, e.g. `subs/abc123/en.srt`.
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}.{}",
            self.kind.prefix(),
            self.video_id,
            self.lang.code(),
            self.kind.extension()
        )
    }

    /// File name used inside the job working directory, e.g. `en.srt`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.lang.code(), self.kind.extension())
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
