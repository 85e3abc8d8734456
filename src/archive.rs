//! ZIP packaging
//!
//! Collects every job's encoded segments into a single archive. The archive
//! is built in a temp file next to the destination and persisted only once
//! it is complete, so a failed batch never leaves a half-written ZIP behind.

use std::io::Write;
use std::path::Path;

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, Result};
use crate::pipeline::JobReport;

/// Default archive name, kept from the original splitter.
pub const ARCHIVE_NAME: &str = "audio_segments.zip";

/// Write all encoded segments from `reports` into a ZIP at `dest`.
///
/// Entries keep job order, then segment order. Returns the number of
/// entries written.
pub fn write_archive(dest: &Path, reports: &[JobReport]) -> Result<usize> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = tempfile::NamedTempFile::new_in(parent)?;

    let mut zip = ZipWriter::new(temp);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0usize;
    for report in reports {
        for segment in &report.segments {
            zip.start_file(segment.file_name.as_str(), options)?;
            zip.write_all(&segment.data)?;
            count += 1;
        }
    }

    let temp = zip.finish()?;
    temp.persist(dest).map_err(|e| AppError::Io(e.error))?;

    info!("Wrote {} segment(s) to '{}'", count, dest.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EncodedSegment;
    use std::io::Read;

    fn report(job_index: usize, segments: Vec<(&str, &[u8])>) -> JobReport {
        JobReport {
            job_index,
            input: "input.wav".into(),
            segments: segments
                .into_iter()
                .map(|(name, data)| EncodedSegment {
                    file_name: name.to_string(),
                    data: data.to_vec(),
                })
                .collect(),
            failed_segments: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_archive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(ARCHIVE_NAME);

        let reports = vec![
            report(0, vec![("segment_1_1.mp3", b"aaa"), ("segment_1_2.mp3", b"bbb")]),
            report(1, vec![("segment_2_1.mp3", b"ccc")]),
        ];
        let count = write_archive(&dest, &reports).unwrap();
        assert_eq!(count, 3);

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["segment_1_1.mp3", "segment_1_2.mp3", "segment_2_1.mp3"]
        );

        let mut content = String::new();
        archive
            .by_name("segment_1_2.mp3")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "bbb");
    }

    #[test]
    fn test_empty_batch_writes_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(ARCHIVE_NAME);

        let count = write_archive(&dest, &[report(0, Vec::new())]).unwrap();
        assert_eq!(count, 0);

        let archive = zip::ZipArchive::new(std::fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
