//! End-to-end pipeline tests on synthesized WAV files.
//!
//! WAV output stays inside hound, so none of these tests need FFmpeg.

use std::io::Read;
use std::path::{Path, PathBuf};

use splitmaster::{
    run_batch, write_archive, AudioBuffer, BatchOptions, JobSpec, OutputFormat, ARCHIVE_NAME,
};

const RATE: u32 = 8000;

fn tone(secs: f64, amplitude: f32) -> Vec<f32> {
    (0..(RATE as f64 * secs) as usize)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / RATE as f32).sin() * amplitude)
        .collect()
}

fn silence(secs: f64) -> Vec<f32> {
    vec![0.0f32; (RATE as f64 * secs) as usize]
}

fn write_input(dir: &Path, name: &str, samples: Vec<f32>) -> PathBuf {
    let path = dir.join(name);
    splitmaster::codec::write_wav(&path, &AudioBuffer::new(RATE, 1, samples)).unwrap();
    path
}

fn wav_duration_secs(data: &[u8]) -> f64 {
    let reader = hound::WavReader::new(std::io::Cursor::new(data)).unwrap();
    reader.duration() as f64 / reader.spec().sample_rate as f64
}

#[tokio::test]
async fn silence_gaps_produce_coalesced_segments() {
    let dir = tempfile::tempdir().unwrap();

    // Two short bursts separated by a long gap: spans of 1s and 1.5s under a
    // 3s target coalesce into a single 2.5s segment.
    let mut samples = tone(1.0, 0.5);
    samples.extend(silence(2.0));
    samples.extend(tone(1.5, 0.5));
    let input = write_input(dir.path(), "bursts.wav", samples);

    let reports = run_batch(
        vec![JobSpec::new(input, 3.0, OutputFormat::Wav)],
        BatchOptions::default(),
    )
    .await
    .unwrap();

    let segments = &reports[0].segments;
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].file_name, "segment_1_1.wav");

    let duration = wav_duration_secs(&segments[0].data);
    assert!(
        (duration - 2.5).abs() < 0.1,
        "expected ~2.5s, got {duration:.2}s"
    );
}

#[tokio::test]
async fn continuous_audio_is_chunked_to_target() {
    let dir = tempfile::tempdir().unwrap();

    // 10s with no silence at target 4s: segments of 4, 4 and 2 seconds.
    let input = write_input(dir.path(), "long.wav", tone(10.0, 0.5));

    let reports = run_batch(
        vec![JobSpec::new(input, 4.0, OutputFormat::Wav)],
        BatchOptions::default(),
    )
    .await
    .unwrap();

    let durations: Vec<f64> = reports[0]
        .segments
        .iter()
        .map(|s| wav_duration_secs(&s.data))
        .collect();
    assert_eq!(durations.len(), 3);
    assert!((durations[0] - 4.0).abs() < 0.01);
    assert!((durations[1] - 4.0).abs() < 0.01);
    assert!((durations[2] - 2.0).abs() < 0.01);
}

#[tokio::test]
async fn all_silent_file_yields_no_segments() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "quiet.wav", silence(5.0));

    let reports = run_batch(
        vec![JobSpec::new(input, 3.0, OutputFormat::Wav)],
        BatchOptions::default(),
    )
    .await
    .unwrap();

    assert!(reports[0].error.is_none());
    assert!(reports[0].segments.is_empty());
}

#[tokio::test]
async fn batch_of_files_lands_in_one_archive() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_input(dir.path(), "one.wav", tone(2.0, 0.5));
    let second = write_input(dir.path(), "two.wav", tone(9.0, 0.5));

    let reports = run_batch(
        vec![
            JobSpec::new(first, 4.0, OutputFormat::Wav),
            JobSpec::new(second, 4.0, OutputFormat::Wav),
        ],
        BatchOptions::default(),
    )
    .await
    .unwrap();

    let dest = dir.path().join(ARCHIVE_NAME);
    let count = write_archive(&dest, &reports).unwrap();
    assert_eq!(count, 4);

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&dest).unwrap()).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "segment_1_1.wav",
            "segment_2_1.wav",
            "segment_2_2.wav",
            "segment_2_3.wav",
        ]
    );

    // Entries are themselves valid WAV files.
    let mut bytes = Vec::new();
    archive
        .by_name("segment_2_3.wav")
        .unwrap()
        .read_to_end(&mut bytes)
        .unwrap();
    assert!((wav_duration_secs(&bytes) - 1.0).abs() < 0.01);
}

#[tokio::test]
async fn order_is_preserved_through_the_whole_pipeline() {
    let dir = tempfile::tempdir().unwrap();

    // Three bursts at distinct levels separated by long gaps. After
    // splitting and re-joining, the bursts must appear in source order.
    let mut samples = vec![0.2f32; RATE as usize];
    samples.extend(silence(1.5));
    samples.extend(vec![0.5f32; RATE as usize]);
    samples.extend(silence(1.5));
    samples.extend(vec![0.8f32; RATE as usize]);
    let input = write_input(dir.path(), "levels.wav", samples);

    // Target far above everything: all three spans coalesce into one segment.
    let reports = run_batch(
        vec![JobSpec::new(input, 60.0, OutputFormat::Wav)],
        BatchOptions::default(),
    )
    .await
    .unwrap();

    let segments = &reports[0].segments;
    assert_eq!(segments.len(), 1);

    let reader = hound::WavReader::new(std::io::Cursor::new(&segments[0].data[..])).unwrap();
    let decoded: Vec<f32> = reader
        .into_samples::<i16>()
        .map(|s| s.unwrap() as f32 / i16::MAX as f32)
        .collect();

    // One sample from the middle of each third.
    let n = decoded.len();
    assert!((decoded[n / 6] - 0.2).abs() < 0.01);
    assert!((decoded[n / 2] - 0.5).abs() < 0.01);
    assert!((decoded[5 * n / 6] - 0.8).abs() < 0.01);
}
