//! Silence detection
//!
//! Energy-based detector that partitions a recording into its non-silent
//! spans. Audio is scanned in short windows; windows whose RMS level stays
//! at or below the threshold form candidate silence, and a silent run at
//! least `min_silence_ms` long is dropped from the output entirely.

use tracing::debug;

use super::buffer::AudioBuffer;

/// Window length for the RMS scan.
const WINDOW_MS: u64 = 10;

/// Default minimum silence length, matching the splitter's historic 1s gap.
pub const DEFAULT_MIN_SILENCE_MS: u64 = 1000;

/// Partition `audio` into its non-silent spans, in chronological order.
///
/// # Arguments
/// * `audio` - decoded audio at any rate/layout
/// * `silence_threshold_db` - level (dBFS) at or below which a window is silent
/// * `min_silence_ms` - minimum run of silent windows that counts as a gap
///
/// # Returns
/// The non-silent spans; empty if the whole buffer is silent.
pub fn detect_spans(
    audio: &AudioBuffer,
    silence_threshold_db: f32,
    min_silence_ms: u64,
) -> Vec<AudioBuffer> {
    if audio.is_empty() {
        return Vec::new();
    }

    let window_frames =
        ((audio.sample_rate() as u64 * WINDOW_MS / 1000) as usize).max(1);
    let min_silence_frames =
        (audio.sample_rate() as u64 * min_silence_ms / 1000) as usize;

    let silences = silence_regions(
        audio,
        window_frames,
        min_silence_frames,
        silence_threshold_db,
    );

    // The non-silent spans are the gaps between silence regions.
    let mut spans = Vec::new();
    let mut cursor = 0usize;
    for (start, end) in &silences {
        if *start > cursor {
            spans.push(audio.slice_frames(cursor, *start));
        }
        cursor = *end;
    }
    if cursor < audio.frames() {
        spans.push(audio.slice_frames(cursor, audio.frames()));
    }

    debug!(
        "Detected {} non-silent span(s) across {:.2}s ({} silence gap(s) removed)",
        spans.len(),
        audio.duration_secs(),
        silences.len()
    );

    spans
}

/// Find runs of silent windows at least `min_silence_frames` long.
///
/// Returns `(start_frame, end_frame)` pairs in chronological order.
fn silence_regions(
    audio: &AudioBuffer,
    window_frames: usize,
    min_silence_frames: usize,
    threshold_db: f32,
) -> Vec<(usize, usize)> {
    let total = audio.frames();
    let ch = audio.channels() as usize;
    let samples = audio.samples();
    let mut regions = Vec::new();
    let mut run_start: Option<usize> = None;

    let mut pos = 0;
    while pos < total {
        let end = (pos + window_frames).min(total);
        let silent = rms_dbfs(&samples[pos * ch..end * ch]) <= threshold_db;

        match (silent, run_start) {
            (true, None) => run_start = Some(pos),
            (false, Some(start)) => {
                if pos - start >= min_silence_frames {
                    regions.push((start, pos));
                }
                run_start = None;
            }
            _ => {}
        }

        pos = end;
    }

    // Trailing silence runs to the end of the buffer.
    if let Some(start) = run_start {
        if total - start >= min_silence_frames {
            regions.push((start, total));
        }
    }

    regions
}

/// RMS level of interleaved samples, in dBFS. Digital silence maps to -inf.
fn rms_dbfs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();
    if rms <= 0.0 {
        f32::NEG_INFINITY
    } else {
        (20.0 * rms.log10()) as f32
    }
}
