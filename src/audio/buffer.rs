//! Decoded audio held in memory
//!
//! All pipeline stages exchange `AudioBuffer`s by value; each stage owns the
//! audio it is currently transforming.

/// Decoded audio: interleaved f32 samples in [-1, 1] at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples.
    ///
    /// The sample count must be a whole number of frames; a trailing partial
    /// frame is truncated.
    pub fn new(sample_rate: u32, channels: u16, mut samples: Vec<f32>) -> Self {
        let ch = channels.max(1) as usize;
        let whole = (samples.len() / ch) * ch;
        samples.truncate(whole);
        Self {
            sample_rate,
            channels: channels.max(1),
            samples,
        }
    }

    /// Create an empty buffer with the same rate and layout as `other`.
    pub fn empty_like(other: &AudioBuffer) -> Self {
        Self {
            sample_rate: other.sample_rate,
            channels: other.channels,
            samples: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn duration_ms(&self) -> i64 {
        (self.duration_secs() * 1000.0) as i64
    }

    /// Copy out the frame range `[start, end)`, clamped to the buffer length.
    pub fn slice_frames(&self, start: usize, end: usize) -> AudioBuffer {
        let ch = self.channels as usize;
        let start = start.min(self.frames());
        let end = end.clamp(start, self.frames());
        AudioBuffer {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: self.samples[start * ch..end * ch].to_vec(),
        }
    }

    /// Append `other`'s samples after this buffer's.
    ///
    /// Both buffers must come from the same decoded file, so rate and layout
    /// always match.
    pub fn append(&mut self, other: &AudioBuffer) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        debug_assert_eq!(self.channels, other.channels);
        self.samples.extend_from_slice(&other.samples);
    }
}
