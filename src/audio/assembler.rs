//! Segment assembly
//!
//! Turns the detector's non-silent spans into output segments close to a
//! target duration. Two passes: oversized spans are first cut into
//! target-sized chunks, then the chunk sequence is greedily coalesced.

use tracing::debug;

use super::buffer::AudioBuffer;
use crate::error::{AppError, Result};

/// Assemble ordered spans into output segments of roughly `target_secs`.
///
/// The coalescing check is performed on the accumulator's duration before
/// each prospective append (strict `<`), so a finished segment may run past
/// the target by up to one chunk. That matches the original splitter and is
/// kept as deliberate policy.
///
/// # Arguments
/// * `spans` - non-silent spans in chronological order
/// * `target_secs` - desired segment duration in seconds; must be > 0
pub fn assemble(spans: Vec<AudioBuffer>, target_secs: f64) -> Result<Vec<AudioBuffer>> {
    if !target_secs.is_finite() || target_secs <= 0.0 {
        return Err(AppError::InvalidArgument(format!(
            "target duration must be greater than zero seconds, got {target_secs}"
        )));
    }
    if spans.is_empty() {
        return Ok(Vec::new());
    }

    let chunks = chunk_spans(spans, target_secs);
    let segments = coalesce(chunks, target_secs);

    debug!(
        "Assembled {} segment(s) at target {:.1}s",
        segments.len(),
        target_secs
    );

    Ok(segments)
}

/// Step A: cut every span of at least `target_secs` into consecutive chunks
/// of exactly the target length, plus a final remainder chunk. Shorter spans
/// pass through untouched.
fn chunk_spans(spans: Vec<AudioBuffer>, target_secs: f64) -> Vec<AudioBuffer> {
    let mut chunks = Vec::with_capacity(spans.len());

    for span in spans {
        let chunk_frames =
            ((target_secs * span.sample_rate() as f64).round() as usize).max(1);
        let total = span.frames();

        if total < chunk_frames {
            chunks.push(span);
            continue;
        }

        let mut start = 0;
        while total - start > chunk_frames {
            chunks.push(span.slice_frames(start, start + chunk_frames));
            start += chunk_frames;
        }
        // Remainder is never empty: 0 < len <= chunk_frames.
        chunks.push(span.slice_frames(start, total));
    }

    chunks
}

/// Step B: single greedy pass over the chunk sequence.
///
/// The accumulator absorbs chunks while its duration is still below the
/// target; once it reaches the target it is emitted and the current chunk
/// seeds the next accumulator. A trailing short accumulator is emitted as
/// its own final segment.
fn coalesce(chunks: Vec<AudioBuffer>, target_secs: f64) -> Vec<AudioBuffer> {
    let mut segments = Vec::new();
    let mut current: Option<AudioBuffer> = None;

    for chunk in chunks {
        match current.take() {
            None => current = Some(chunk),
            Some(mut acc) if acc.duration_secs() < target_secs => {
                acc.append(&chunk);
                current = Some(acc);
            }
            Some(acc) => {
                segments.push(acc);
                current = Some(chunk);
            }
        }
    }

    if let Some(acc) = current {
        segments.push(acc);
    }

    segments
}
