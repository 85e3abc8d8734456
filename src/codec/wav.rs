//! WAV reading and writing via hound
//!
//! WAV is the crate's native interchange format: WAV inputs are read
//! directly, every other format passes through FFmpeg with a WAV temp file
//! on one side.

use std::io::Cursor;
use std::path::Path;

use tracing::info;

use crate::audio::AudioBuffer;
use crate::error::{AppError, Result};

/// Load a WAV file, keeping its native rate and channel layout.
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let reader =
        hound::WavReader::open(path).map_err(|e| AppError::decode(path, e.to_string()))?;

    let spec = reader.spec();
    info!(
        "Loading WAV '{}': {}Hz, {} channel(s), {:?}",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.sample_format
    );

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::decode(path, e.to_string()))?,
        hound::SampleFormat::Int => {
            let max_val = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| AppError::decode(path, e.to_string()))?
        }
    };

    Ok(AudioBuffer::new(spec.sample_rate, spec.channels, samples))
}

/// Render a buffer as a 16-bit PCM WAV file in memory.
pub fn wav_bytes(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AppError::encode("wav", e.to_string()))?;
        for &sample in buffer.samples() {
            let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(clamped)
                .map_err(|e| AppError::encode("wav", e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AppError::encode("wav", e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Write a buffer to disk as 16-bit PCM WAV.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let bytes = wav_bytes(buffer)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_round_trip() {
        let samples: Vec<f32> = (0..16000)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 16000.0).sin() * 0.5)
            .collect();
        let buffer = AudioBuffer::new(16000, 1, samples);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, &buffer).unwrap();

        let loaded = read_wav(&path).unwrap();
        assert_eq!(loaded.sample_rate(), 16000);
        assert_eq!(loaded.channels(), 1);
        assert_eq!(loaded.frames(), buffer.frames());

        // Quantized to 16 bits, so compare within one LSB.
        for (a, b) in loaded.samples().iter().zip(buffer.samples()) {
            assert!((a - b).abs() < 2.0 / i16::MAX as f32);
        }
    }

    #[test]
    fn test_stereo_layout_preserved() {
        let buffer = AudioBuffer::new(44100, 2, vec![0.1f32; 44100 * 2]);
        let bytes = wav_bytes(&buffer).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44100);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let err = read_wav(Path::new("/nonexistent/file.wav")).unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }
}
