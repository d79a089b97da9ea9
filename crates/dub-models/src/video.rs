//! Video summary record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lang::Lang;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Ready,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Ready => "ready",
        }
    }
}

/// Denormalized per-video availability, keyed by video id.
///
/// Written only when a pipeline completes, merged into any existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub status: VideoStatus,
    pub langs: BTreeMap<Lang, bool>,
}

impl VideoSummary {
    /// Summary for a fully localized video: ready, every language available.
    pub fn ready(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            status: VideoStatus::Ready,
            langs: Lang::ALL.iter().map(|l| (*l, true)).collect(),
        }
    }
}
