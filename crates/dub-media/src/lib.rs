//! External media tools for the dubbing pipeline.
//!
//! This crate provides:
//! - FFmpeg command building and a generic tool runner
//! - Audio download through yt-dlp, transcoded to 16 kHz mono WAV
//! - Transcription through the whisper.cpp CLI
//! - Silent MP3 placeholders

pub mod command;
pub mod config;
pub mod download;
pub mod error;
pub mod silence;
pub mod transcribe;

pub use command::{run_tool, FfmpegCommand};
pub use config::MediaConfig;
pub use download::{fetch_audio, youtube_url};
pub use error::{MediaError, MediaResult};
pub use silence::{write_silent_mp3, PLACEHOLDER_SECONDS};
pub use transcribe::{parse_whisper_json, WhisperCli};
