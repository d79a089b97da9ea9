//! Silent MP3 placeholder used when no speech synthesis is available.

use std::path::Path;

use tracing::warn;

use crate::command::FfmpegCommand;
use crate::config::MediaConfig;
use crate::error::MediaResult;

pub const PLACEHOLDER_SECONDS: f64 = 3.0;

/// Bare ID3 tag marker written when ffmpeg cannot produce real audio.
pub const ID3_MARKER: &[u8] = b"ID3";

/// Write a silent mono MP3 of `seconds` to `out`.
///
/// Falls back to a bare ID3 marker if ffmpeg is missing or fails; only an
/// I/O error writing that fallback is returned.
pub async fn write_silent_mp3(config: &MediaConfig, out: &Path, seconds: f64) -> MediaResult<()> {
    let result = match config.ffmpeg() {
        Ok(ffmpeg) => {
            FfmpegCommand::lavfi("anullsrc=r=44100:cl=mono", out)
                .duration(seconds)
                .audio_quality(9)
                .audio_codec("libmp3lame")
                .run(&ffmpeg)
                .await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        warn!("Silent MP3 generation failed, writing ID3 marker instead: {}", e);
        tokio::fs::write(out, ID3_MARKER).await?;
    }
    Ok(())
}
