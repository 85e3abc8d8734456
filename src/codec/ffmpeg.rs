//! FFmpeg CLI wrapper
//!
//! The crate never decodes or encodes compressed audio itself; anything
//! that is not WAV is delegated to the `ffmpeg` executable on PATH.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{AppError, Result};

/// Locate the FFmpeg executable.
pub fn check_ffmpeg() -> Result<PathBuf> {
    which::which("ffmpeg").map_err(|_| AppError::FfmpegNotFound)
}

/// Builder for a single FFmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    output_args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    /// Add an argument placed after `-i <input>`.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set the audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Drop any video stream (cover art in audio containers).
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            self.input.to_string_lossy().to_string(),
        ];
        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());
        args
    }

    /// Run the command to completion, capturing stderr for error reporting.
    pub async fn run(&self) -> Result<()> {
        check_ffmpeg()?;

        let args = self.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(AppError::Ffmpeg(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_shape() {
        let cmd = FfmpegCommand::new("in.mp3", "out.wav")
            .no_video()
            .audio_codec("pcm_s16le");
        let args = cmd.build_args();

        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.contains(&"-c:a".to_string()));
        assert!(args.contains(&"pcm_s16le".to_string()));
        assert_eq!(args.last().unwrap(), "out.wav");
        // Input path directly follows -i.
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i + 1], "in.mp3");
    }
}
