//! Source audio download via yt-dlp, transcoded for speech recognition.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{run_tool, FfmpegCommand};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// Sample rate the transcriber expects.
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;

pub fn youtube_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// yt-dlp arguments extracting best-quality audio as MP3 into `out_mp3`.
pub fn ytdlp_audio_args(video_id: &str, out_mp3: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "bestaudio/best".to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        "mp3".to_string(),
        "-o".to_string(),
        out_mp3.to_string_lossy().to_string(),
        youtube_url(video_id),
    ]
}

/// Download the video's audio into `dir` and convert it to mono 16 kHz WAV.
///
/// Returns the path of the WAV file.
pub async fn fetch_audio(config: &MediaConfig, video_id: &str, dir: &Path) -> MediaResult<PathBuf> {
    let ytdlp = config.ytdlp()?;
    let ffmpeg = config.ffmpeg()?;

    let mp3 = dir.join("audio.mp3");
    let wav = dir.join("audio.wav");

    info!(video_id = %video_id, "Downloading audio with yt-dlp");
    run_tool(&ytdlp, ytdlp_audio_args(video_id, &mp3)).await?;
    if !mp3.exists() {
        return Err(MediaError::MissingOutput(mp3));
    }

    FfmpegCommand::new(&mp3, &wav)
        .audio_channels(1)
        .sample_rate(SPEECH_SAMPLE_RATE)
        .run(&ffmpeg)
        .await?;
    if !wav.exists() {
        return Err(MediaError::MissingOutput(wav));
    }

    let size = tokio::fs::metadata(&wav).await?.len();
    info!(video_id = %video_id, size_bytes = size, "Audio ready: {}", wav.display());
    Ok(wav)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ytdlp_args() {
        let args = ytdlp_audio_args("abc123", Path::new("/tmp/job/audio.mp3"));
        assert_eq!(args[..5], ["-f", "bestaudio/best", "-x", "--audio-format", "mp3"]);
        assert_eq!(args[6], "/tmp/job/audio.mp3");
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc123");
    }

    #[tokio::test]
    async fn test_missing_downloader() {
        let config = MediaConfig {
            ytdlp_bin: "no-such-yt-dlp-binary".to_string(),
            ..MediaConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let err = fetch_audio(&config, "abc123", dir.path()).await.unwrap_err();
        assert!(matches!(err, MediaError::YtDlpNotFound));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_downloader_failure_is_process_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-yt-dlp");
        std::fs::write(&fake, "#!/bin/sh\necho 'ERROR: [youtube] abc123: Video unavailable' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = MediaConfig {
            ytdlp_bin: fake.to_string_lossy().to_string(),
            ffmpeg_bin: "sh".to_string(),
            ..MediaConfig::default()
        };
        let err = fetch_audio(&config, "abc123", dir.path()).await.unwrap_err();
        assert!(err.is_process_failure());
        assert!(err.to_string().contains("Video unavailable"));
    }
}
