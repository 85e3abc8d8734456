use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, Command};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use splitmaster::{
    run_batch, write_archive, BatchOptions, JobSpec, OutputFormat, ProgressEvent, ARCHIVE_NAME,
};

fn parse_target_duration(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("invalid duration '{value}'"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("duration must be greater than zero seconds".into());
    }
    Ok(secs)
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    value.parse::<OutputFormat>().map_err(|e| e.to_string())
}

fn build_cli() -> Command {
    Command::new("splitmaster")
        .about("Split audio files at silence and regroup the pieces into fixed-duration segments")
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .help("Audio files to split")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("duration")
                .short('d')
                .long("duration")
                .value_name("SECONDS")
                .help("Target segment duration in seconds")
                .required(true)
                .value_parser(parse_target_duration),
        )
        .arg(
            Arg::new("threshold")
                .short('t')
                .long("silence-threshold")
                .value_name("DBFS")
                .help("Level at or below which audio counts as silence")
                .default_value("-40")
                .allow_hyphen_values(true)
                .value_parser(value_parser!(f32)),
        )
        .arg(
            Arg::new("min-silence")
                .long("min-silence")
                .value_name("MS")
                .help("Minimum silence gap that splits the audio")
                .default_value("1000")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format: wav, mp3, flac, ogg or m4a")
                .default_value("mp3")
                .value_parser(parse_format),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Directory the archive is written to")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Maximum files processed in parallel (default: CPU count)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("json-progress")
                .long("json-progress")
                .help("Print one JSON line per finished file")
                .action(ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("splitmaster=info".parse()?))
        .init();

    let matches = build_cli().get_matches();

    let files: Vec<PathBuf> = matches
        .get_many::<PathBuf>("files")
        .expect("required argument")
        .cloned()
        .collect();
    for file in &files {
        if !file.is_file() {
            return Err(anyhow!("input file does not exist: {}", file.display()));
        }
    }

    let target_secs = *matches
        .get_one::<f64>("duration")
        .expect("required argument");
    let threshold_db = *matches.get_one::<f32>("threshold").expect("defaulted");
    let min_silence_ms = *matches.get_one::<u64>("min-silence").expect("defaulted");
    let format = *matches.get_one::<OutputFormat>("format").expect("defaulted");
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .expect("defaulted")
        .clone();
    let jobs = matches.get_one::<usize>("jobs").copied();
    let json_progress = matches.get_flag("json-progress");

    // Anything beyond WAV needs the external codec; fail fast if it is missing.
    let needs_ffmpeg = format != OutputFormat::Wav
        || files.iter().any(|f| {
            f.extension()
                .and_then(|e| e.to_str())
                .map(|e| !e.eq_ignore_ascii_case("wav"))
                .unwrap_or(true)
        });
    if needs_ffmpeg {
        splitmaster::codec::check_ffmpeg().context("this run requires FFmpeg")?;
    }

    let specs: Vec<JobSpec> = files
        .iter()
        .map(|file| JobSpec {
            input: file.clone(),
            target_secs,
            silence_threshold_db: threshold_db,
            min_silence_ms,
            format,
        })
        .collect();
    let total = specs.len();

    // Ctrl-C requests cooperative cancellation: running files finish,
    // nothing new starts.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested; finishing in-flight files");
            let _ = cancel_tx.send(true);
        }
    });

    let (progress_tx, mut progress_rx) = mpsc::channel::<ProgressEvent>(total.max(1));
    let printer = tokio::spawn(async move {
        let mut completed = 0usize;
        while let Some(event) = progress_rx.recv().await {
            completed += 1;
            if json_progress {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("Failed to serialize progress event: {}", e),
                }
            } else if let Some(ref error) = event.error {
                warn!(
                    "[{}/{}] {} failed: {}",
                    completed,
                    total,
                    event.input.display(),
                    error
                );
            } else {
                info!(
                    "[{}/{}] {} -> {} segment(s)",
                    completed,
                    total,
                    event.input.display(),
                    event.segment_names.len()
                );
            }
        }
    });

    let opts = BatchOptions {
        max_parallel: jobs,
        cancel: Some(cancel_rx),
        progress: Some(progress_tx),
    };
    let reports = run_batch(specs, opts)
        .await
        .context("batch processing failed")?;
    let _ = printer.await;

    let failed: Vec<_> = reports.iter().filter(|r| r.error.is_some()).collect();
    for report in &failed {
        eprintln!(
            "error: {}: {}",
            report.input.display(),
            report.error.as_deref().unwrap_or("unknown failure")
        );
    }

    let archive_path = output_dir.join(ARCHIVE_NAME);
    let count = write_archive(&archive_path, &reports)
        .with_context(|| format!("failed to write archive '{}'", archive_path.display()))?;

    println!(
        "Wrote {} segment(s) from {} file(s) to {}",
        count,
        reports.len() - failed.len(),
        archive_path.display()
    );

    if !failed.is_empty() {
        return Err(anyhow!("{} of {} file(s) failed", failed.len(), total));
    }
    Ok(())
}
