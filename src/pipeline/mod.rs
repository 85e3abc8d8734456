//! Batch pipeline
//!
//! Fan-out/fan-in over independent jobs: each input file is decoded, split
//! at silence, reassembled to the target duration, and encoded, with no
//! state shared between jobs. Completions flow back over a channel and are
//! collected in job order.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{info, warn};

use crate::audio::{assemble, detect_spans, AudioBuffer, DEFAULT_MIN_SILENCE_MS};
use crate::codec::{self, OutputFormat};
use crate::error::{AppError, Result};

/// One input file's processing parameters. The unit of parallel work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Path of the audio file to split.
    pub input: PathBuf,
    /// Desired output segment duration in seconds.
    pub target_secs: f64,
    /// Silence threshold in dBFS.
    pub silence_threshold_db: f32,
    /// Minimum silence gap in milliseconds.
    pub min_silence_ms: u64,
    /// Container format for the encoded segments.
    pub format: OutputFormat,
}

impl JobSpec {
    pub fn new(input: impl Into<PathBuf>, target_secs: f64, format: OutputFormat) -> Self {
        Self {
            input: input.into(),
            target_secs,
            silence_threshold_db: -40.0,
            min_silence_ms: DEFAULT_MIN_SILENCE_MS,
            format,
        }
    }

    /// Submission-time validation. Rejecting here keeps bad parameters from
    /// ever dispatching a job.
    fn validate(&self) -> Result<()> {
        if !self.target_secs.is_finite() || self.target_secs <= 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "'{}': target duration must be greater than zero seconds",
                self.input.display()
            )));
        }
        Ok(())
    }
}

/// An encoded output segment ready for archiving.
#[derive(Debug, Clone)]
pub struct EncodedSegment {
    /// Deterministic archive entry name: `segment_{file}_{segment}.{ext}`.
    pub file_name: String,
    pub data: Vec<u8>,
}

/// A segment that could not be encoded. The rest of the job still completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentFailure {
    pub file_name: String,
    pub message: String,
}

/// Outcome of one job.
#[derive(Debug)]
pub struct JobReport {
    pub job_index: usize,
    pub input: PathBuf,
    /// Segments that encoded successfully, in chronological order.
    pub segments: Vec<EncodedSegment>,
    /// Per-segment encode failures.
    pub failed_segments: Vec<SegmentFailure>,
    /// Set when the job failed before producing any segments.
    pub error: Option<String>,
}

/// Progress notification emitted once per finished job.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub job_index: usize,
    pub input: PathBuf,
    pub segment_names: Vec<String>,
    pub error: Option<String>,
}

/// Knobs for a batch run.
#[derive(Default)]
pub struct BatchOptions {
    /// Maximum jobs in flight. Defaults to the CPU count.
    pub max_parallel: Option<usize>,
    /// Cooperative cancellation: once true, no new jobs are dispatched.
    pub cancel: Option<watch::Receiver<bool>>,
    /// Receives one event per finished job.
    pub progress: Option<mpsc::Sender<ProgressEvent>>,
}

/// Run every job, collecting reports in job order.
///
/// All specs are validated before anything is dispatched; a single invalid
/// spec fails the whole batch. Decode and encode failures inside a job are
/// recorded in its report without touching sibling jobs.
pub async fn run_batch(specs: Vec<JobSpec>, opts: BatchOptions) -> Result<Vec<JobReport>> {
    for spec in &specs {
        spec.validate()?;
    }

    let parallelism = opts.max_parallel.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let (done_tx, mut done_rx) = mpsc::channel::<JobReport>(specs.len().max(1));

    info!(
        "Dispatching {} job(s), up to {} in parallel",
        specs.len(),
        parallelism
    );

    let total = specs.len();
    let mut dispatched = 0usize;
    for (job_index, spec) in specs.into_iter().enumerate() {
        if let Some(ref cancel) = opts.cancel {
            if *cancel.borrow() {
                warn!("Batch cancelled; not dispatching job {}", job_index + 1);
                break;
            }
        }

        let semaphore = Arc::clone(&semaphore);
        let done_tx = done_tx.clone();
        dispatched += 1;
        tokio::spawn(async move {
            // The semaphore is never closed, so acquire cannot fail.
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };
            let report = run_job(job_index, spec).await;
            let _ = done_tx.send(report).await;
        });
    }
    drop(done_tx);

    let mut reports = Vec::with_capacity(dispatched);
    while let Some(report) = done_rx.recv().await {
        if let Some(ref progress) = opts.progress {
            let event = ProgressEvent {
                job_index: report.job_index,
                input: report.input.clone(),
                segment_names: report
                    .segments
                    .iter()
                    .map(|s| s.file_name.clone())
                    .collect(),
                error: report.error.clone(),
            };
            let _ = progress.send(event).await;
        }
        reports.push(report);
    }

    reports.sort_by_key(|r| r.job_index);
    if dispatched < total {
        info!(
            "Batch stopped after {} of {} job(s) (cancelled)",
            dispatched, total
        );
    }
    Ok(reports)
}

/// One file through the whole pipeline: decode, detect, assemble, encode.
async fn run_job(job_index: usize, spec: JobSpec) -> JobReport {
    let input = spec.input.clone();
    info!(
        "Job {}: splitting '{}' into {:.0}s {} segments",
        job_index + 1,
        input.display(),
        spec.target_secs,
        spec.format
    );

    match process_job(job_index, &spec).await {
        Ok((segments, failed_segments)) => JobReport {
            job_index,
            input,
            segments,
            failed_segments,
            error: None,
        },
        Err(e) => {
            warn!("Job {} failed: {}", job_index + 1, e);
            JobReport {
                job_index,
                input,
                segments: Vec::new(),
                failed_segments: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

async fn process_job(
    job_index: usize,
    spec: &JobSpec,
) -> Result<(Vec<EncodedSegment>, Vec<SegmentFailure>)> {
    let audio = codec::decode(&spec.input).await?;

    // Detection and assembly are pure CPU work on resident samples.
    let threshold = spec.silence_threshold_db;
    let min_silence = spec.min_silence_ms;
    let target = spec.target_secs;
    let buffers: Vec<AudioBuffer> = tokio::task::spawn_blocking(move || {
        let spans = detect_spans(&audio, threshold, min_silence);
        assemble(spans, target)
    })
    .await
    .map_err(|e| AppError::decode(&spec.input, e.to_string()))??;

    let mut segments = Vec::with_capacity(buffers.len());
    let mut failed = Vec::new();
    for (segment_index, buffer) in buffers.iter().enumerate() {
        let file_name = segment_file_name(job_index, segment_index, spec.format);
        match codec::encode(buffer, spec.format, &file_name).await {
            Ok(data) => segments.push(EncodedSegment { file_name, data }),
            Err(AppError::Encode { name, message }) => {
                // One bad segment does not sink the job.
                warn!("Skipping segment '{}': {}", name, message);
                failed.push(SegmentFailure {
                    file_name: name,
                    message,
                });
            }
            Err(other) => return Err(other),
        }
    }

    info!(
        "Job {}: produced {} segment(s){}",
        job_index + 1,
        segments.len(),
        if failed.is_empty() {
            String::new()
        } else {
            format!(", {} failed to encode", failed.len())
        }
    );

    Ok((segments, failed))
}

/// Deterministic 1-based segment naming.
pub fn segment_file_name(file_index: usize, segment_index: usize, format: OutputFormat) -> String {
    format!(
        "segment_{}_{}.{}",
        file_index + 1,
        segment_index + 1,
        format.extension()
    )
}
