//! splitmaster - silence-based audio splitting
//!
//! Splits audio recordings at silence, regroups the non-silent pieces into
//! segments close to a target duration, and packages the encoded segments
//! into a ZIP archive. Decoding and encoding of compressed formats is
//! delegated to FFmpeg; only WAV is handled natively.

pub mod archive;
pub mod audio;
pub mod codec;
pub mod error;
pub mod pipeline;

pub use archive::{write_archive, ARCHIVE_NAME};
pub use audio::{assemble, detect_spans, AudioBuffer, DEFAULT_MIN_SILENCE_MS};
pub use codec::OutputFormat;
pub use error::{AppError, Result};
pub use pipeline::{run_batch, BatchOptions, JobReport, JobSpec, ProgressEvent};
