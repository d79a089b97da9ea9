//! Shared data models for the dubbing pipeline.
//!
//! This crate provides:
//! - Jobs, job status and the ordered step catalog
//! - Deterministic artifact paths (subtitles and dubbed audio)
//! - The video summary record written on completion
//! - SRT subtitle parsing and serialization

pub mod artifact;
pub mod error;
pub mod job;
pub mod lang;
pub mod step;
pub mod subtitle;
pub mod video;

pub use artifact::{ArtifactKind, ArtifactPath};
pub use error::{ModelError, ModelResult};
pub use job::{Job, JobId, JobStatus};
pub use lang::Lang;
pub use step::{Step, TERMINAL_STEP};
pub use subtitle::{format_timestamp, plain_text, Cue, LineKind, Segment, SubtitleDocument};
pub use video::{VideoStatus, VideoSummary};
