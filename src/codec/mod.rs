//! Decode/encode delegation
//!
//! WAV goes straight through hound; every other container is handed to the
//! FFmpeg collaborator with a temporary WAV on one side of the conversion.

pub mod ffmpeg;
pub mod wav;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audio::AudioBuffer;
use crate::error::{AppError, Result};

pub use ffmpeg::{check_ffmpeg, FfmpegCommand};
pub use wav::{read_wav, wav_bytes, write_wav};

/// Supported output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
    M4a,
}

impl OutputFormat {
    /// File extension for segment names.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "ogg",
            OutputFormat::M4a => "m4a",
        }
    }

    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Wav,
        OutputFormat::Mp3,
        OutputFormat::Flac,
        OutputFormat::Ogg,
        OutputFormat::M4a,
    ];
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "mp3" => Ok(OutputFormat::Mp3),
            "flac" => Ok(OutputFormat::Flac),
            "ogg" => Ok(OutputFormat::Ogg),
            "m4a" => Ok(OutputFormat::M4a),
            other => Err(AppError::InvalidArgument(format!(
                "unrecognized output format '{other}' (expected one of wav, mp3, flac, ogg, m4a)"
            ))),
        }
    }
}

/// Decode an input file into an `AudioBuffer` at its native rate and layout.
pub async fn decode(path: &Path) -> Result<AudioBuffer> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if extension == "wav" {
        let owned = path.to_path_buf();
        return tokio::task::spawn_blocking(move || read_wav(&owned))
            .await
            .map_err(|e| AppError::decode(path, e.to_string()))?;
    }

    // Anything else: let FFmpeg transcode to a temporary PCM WAV, then read it.
    let dir = tempfile::tempdir()?;
    let wav_path = dir.path().join("decoded.wav");

    FfmpegCommand::new(path, &wav_path)
        .no_video()
        .audio_codec("pcm_s16le")
        .run()
        .await
        .map_err(|e| match e {
            AppError::Ffmpeg(message) => AppError::decode(path, message),
            other => other,
        })?;

    let buffer = tokio::task::spawn_blocking(move || {
        let buffer = read_wav(&wav_path);
        drop(dir);
        buffer
    })
    .await
    .map_err(|e| AppError::decode(path, e.to_string()))??;

    info!(
        "Decoded '{}': {:.2}s at {}Hz",
        path.display(),
        buffer.duration_secs(),
        buffer.sample_rate()
    );

    Ok(buffer)
}

/// Encode a buffer into `format`, returning the file content.
pub async fn encode(buffer: &AudioBuffer, format: OutputFormat, name: &str) -> Result<Vec<u8>> {
    let wav = wav_bytes(buffer).map_err(|e| AppError::encode(name, e.to_string()))?;

    if format == OutputFormat::Wav {
        return Ok(wav);
    }

    let dir = tempfile::tempdir()?;
    let wav_path = dir.path().join("segment.wav");
    let out_path = dir.path().join(format!("segment.{}", format.extension()));
    tokio::fs::write(&wav_path, &wav).await?;

    FfmpegCommand::new(&wav_path, &out_path)
        .run()
        .await
        .map_err(|e| match e {
            AppError::Ffmpeg(message) => AppError::encode(name, message),
            other => other,
        })?;

    let data = tokio::fs::read(&out_path).await?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("mp3".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
        assert_eq!("WAV".parse::<OutputFormat>().unwrap(), OutputFormat::Wav);
        assert_eq!("m4a".parse::<OutputFormat>().unwrap(), OutputFormat::M4a);
        assert!(matches!(
            "aiff".parse::<OutputFormat>(),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_extension_round_trip() {
        for format in OutputFormat::ALL {
            assert_eq!(format.extension().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[tokio::test]
    async fn test_wav_encode_is_native() {
        let buffer = AudioBuffer::new(8000, 1, vec![0.1f32; 8000]);
        let data = encode(&buffer, OutputFormat::Wav, "segment_1_1.wav")
            .await
            .unwrap();
        // RIFF header without going through FFmpeg.
        assert_eq!(&data[..4], b"RIFF");
    }
}
