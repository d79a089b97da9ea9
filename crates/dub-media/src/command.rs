//! FFmpeg command builder and external tool runner.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path, or a lavfi graph when `input_format` is `lavfi`
    input: String,
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_string_lossy().to_string(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Synthetic input from a libavfilter source such as `anullsrc`.
    pub fn lavfi(graph: impl Into<String>, output: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new("", output);
        cmd.input = graph.into();
        cmd.input_arg("-f").input_arg("lavfi")
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Limit output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    pub fn audio_channels(self, channels: u8) -> Self {
        self.output_arg("-ac").output_arg(channels.to_string())
    }

    pub fn sample_rate(self, hz: u32) -> Self {
        self.output_arg("-ar").output_arg(hz.to_string())
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-acodec").output_arg(codec)
    }

    /// Set VBR audio quality (`-q:a`).
    pub fn audio_quality(self, quality: u8) -> Self {
        self.output_arg("-q:a").output_arg(quality.to_string())
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.clone());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Run with the given ffmpeg binary.
    pub async fn run(&self, ffmpeg: impl AsRef<OsStr>) -> MediaResult<()> {
        run_tool(ffmpeg, &self.build_args()).await.map(|_| ())
    }
}

/// Run an external tool to completion, capturing its output.
///
/// A non-zero exit becomes [`MediaError::ProcessFailed`] carrying the last
/// non-empty stderr line.
pub async fn run_tool<I, S>(program: impl AsRef<OsStr>, args: I) -> MediaResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let name = Path::new(program)
        .file_name()
        .unwrap_or(program)
        .to_string_lossy()
        .to_string();

    let mut cmd = Command::new(program);
    cmd.args(args);
    debug!(program = %name, "Running {:?}", cmd.as_std());

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!(program = %name, "stderr: {}", stderr);
    let last_line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("Unknown error");

    Err(MediaError::process_failed(name, output.status.code(), last_line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("in.mp3", "out.wav")
            .audio_channels(1)
            .sample_rate(16000);

        assert_eq!(
            cmd.build_args(),
            vec!["-y", "-v", "error", "-i", "in.mp3", "-ac", "1", "-ar", "16000", "out.wav"]
        );
    }

    #[test]
    fn test_lavfi_input() {
        let args = FfmpegCommand::lavfi("anullsrc=r=44100:cl=mono", "silence.mp3")
            .duration(3.0)
            .build_args();

        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(&args[i - 2..i], &["-f", "lavfi"]);
        assert_eq!(args[i + 1], "anullsrc=r=44100:cl=mono");
        assert!(args.contains(&"3.000".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_reports_last_stderr_line() {
        let err = run_tool("sh", ["-c", "echo first >&2; echo 'ERROR: boom' >&2; exit 3"])
            .await
            .unwrap_err();

        match err {
            MediaError::ProcessFailed { program, code, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "ERROR: boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_success() {
        let output = run_tool("sh", ["-c", "printf ok"]).await.unwrap();
        assert_eq!(output.stdout, b"ok");
    }
}
