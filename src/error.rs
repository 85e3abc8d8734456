use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while splitting and packaging audio.
#[derive(Debug, Error)]
pub enum AppError {
    /// The input file could not be decoded.
    #[error("failed to decode '{}': {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    /// A finished segment could not be encoded to the requested format.
    #[error("failed to encode '{name}': {message}")]
    Encode { name: String, message: String },

    /// A caller-supplied parameter was rejected before any work started.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// FFmpeg is required for non-WAV formats but was not found in PATH.
    #[error("ffmpeg executable not found in PATH")]
    FfmpegNotFound,

    /// An FFmpeg invocation failed. Mapped to Decode or Encode at call sites.
    #[error("{0}")]
    Ffmpeg(String),

    /// Archive or temporary-storage IO failure. Fatal to the batch.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Archive writing failed. Fatal to the batch.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl AppError {
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn encode(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
