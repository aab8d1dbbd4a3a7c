//! Replay command - feed recorded frames through the analyzer and a scan session.
//!
//! Each frame is a JSON file holding what the barcode and text engines
//! returned for it, so a capture can be replayed without a camera.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use avp_core::{
    cancel_pair, BarcodeDetection, BarcodeReader, FinalizedRecord, Frame, FrameAnalyzer,
    MemoryStore, RecognitionError, RecognizedText, ScanSession, ScannedObservation, SessionError,
    SessionEvent, TextReader,
};

use super::load_config;

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// Frame recordings (glob pattern, e.g. "capture/*.json")
    #[arg(required = true)]
    input: String,

    /// Send the last frame as a manual capture
    #[arg(long)]
    manual_last: bool,

    /// Delay between frames in milliseconds
    #[arg(long, default_value = "0")]
    interval_ms: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// One recorded frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FrameRecording {
    width: u32,
    height: u32,

    /// Frame image, relative to the recording file.
    image: Option<PathBuf>,

    barcodes: Vec<BarcodeDetection>,
    text: RecognizedText,

    /// Simulated engine failures.
    barcode_error: Option<String>,
    text_error: Option<String>,
}

/// Engines answering from recordings, keyed by frame sequence.
#[derive(Debug, Default)]
struct RecordedEngines {
    recordings: HashMap<u64, FrameRecording>,
}

impl RecordedEngines {
    fn recording(&self, frame: &Frame) -> Option<&FrameRecording> {
        self.recordings.get(&frame.sequence)
    }
}

impl BarcodeReader for RecordedEngines {
    async fn scan(&self, frame: &Frame) -> Result<Vec<BarcodeDetection>, RecognitionError> {
        let recording = self
            .recording(frame)
            .ok_or_else(|| RecognitionError::Barcode("no recording for frame".to_string()))?;
        match &recording.barcode_error {
            Some(error) => Err(RecognitionError::Barcode(error.clone())),
            None => Ok(recording.barcodes.clone()),
        }
    }
}

impl TextReader for RecordedEngines {
    async fn recognize(&self, frame: &Frame) -> Result<RecognizedText, RecognitionError> {
        let recording = self
            .recording(frame)
            .ok_or_else(|| RecognitionError::Text("no recording for frame".to_string()))?;
        match &recording.text_error {
            Some(error) => Err(RecognitionError::Text(error.clone())),
            None => Ok(recording.text.clone()),
        }
    }
}

/// Everything a replay produced.
#[derive(Debug, Default, Serialize)]
struct ReplayReport {
    frames: usize,
    records: Vec<FinalizedRecord>,
    returned: Vec<ScannedObservation>,
    duplicates: Vec<String>,
}

pub async fn run(args: ReplayArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let paths: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();

    if paths.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let mut engines = RecordedEngines::default();
    let mut frames = Vec::with_capacity(paths.len());
    for (sequence, path) in (0u64..).zip(&paths) {
        let (frame, recording) = load_frame(path)?;
        engines.recordings.insert(sequence, recording);
        frames.push(frame.with_sequence(sequence));
    }

    eprintln!(
        "{} Replaying {} frames in {:?} mode",
        style("ℹ").blue(),
        frames.len(),
        config.scan.mode
    );

    let engines = Arc::new(engines);
    let analyzer = FrameAnalyzer::new(engines.clone(), engines).with_config(&config);
    let (handle, mut events, task) = ScanSession::spawn(config.scan.clone(), MemoryStore::new());

    let (cancel, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let pb = ProgressBar::new(frames.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames")?
            .progress_chars("=>-"),
    );

    let last = frames.len() - 1;
    let mut replayed = 0;
    for (index, frame) in frames.iter().enumerate() {
        let Some(analysis) = analyzer.analyze(frame, &token).await? else {
            warn!("Replay interrupted");
            break;
        };
        replayed += 1;

        let observation = analysis.observation;
        let sent = if args.manual_last && index == last {
            handle.trigger_manual(Some(observation)).await
        } else {
            handle.submit(observation).await
        };

        if let Err(SessionError::Closed) = sent {
            info!("Session ended after frame {}", index + 1);
            break;
        }

        pb.inc(1);
        if args.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
        }
    }
    pb.finish_and_clear();

    // Give an armed stability timer the chance to fire before closing.
    if !handle.is_closed() {
        tokio::time::sleep(Duration::from_millis(config.scan.stability_delay_ms + 20)).await;
        let _ = handle.close().await;
    }

    let store = task.await?;

    let mut report = ReplayReport {
        frames: replayed,
        records: store.into_records(),
        ..Default::default()
    };
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Returned { observation } => report.returned.push(observation),
            SessionEvent::Duplicate { tracking_number } => report.duplicates.push(tracking_number),
            other => debug!("Session event: {:?}", other),
        }
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Csv => format_csv(&report.records)?,
        OutputFormat::Text => format_text(&report),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    eprintln!(
        "{} Replayed {} frames in {:?}: {} saved, {} returned, {} duplicate(s)",
        style("✓").green(),
        report.frames,
        start.elapsed(),
        style(report.records.len()).green(),
        report.returned.len(),
        style(report.duplicates.len()).yellow()
    );

    Ok(())
}

fn load_frame(path: &Path) -> anyhow::Result<(Frame, FrameRecording)> {
    let content = fs::read_to_string(path)?;
    let recording: FrameRecording = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid frame recording {}: {}", path.display(), e))?;

    let image_path = recording
        .image
        .as_ref()
        .map(|image| path.parent().unwrap_or(Path::new(".")).join(image));

    let frame = match &image_path {
        Some(image_path) if recording.width == 0 || recording.height == 0 => {
            match image::open(image_path) {
                Ok(image) => Frame::from_image(image).with_image_path(image_path),
                Err(e) => {
                    warn!("Cannot open {}: {}", image_path.display(), e);
                    Frame::new(recording.width, recording.height).with_image_path(image_path)
                }
            }
        }
        Some(image_path) => Frame::new(recording.width, recording.height).with_image_path(image_path),
        None => Frame::new(recording.width, recording.height).with_image_path(path),
    };

    Ok((frame, recording))
}

fn format_csv(records: &[FinalizedRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "tracking_number",
        "tracking_type",
        "address",
        "confidence_status",
        "iso_key",
        "ocr_key",
        "image_path",
        "captured_at",
    ])?;

    for record in records {
        wtr.write_record([
            record.tracking_number.clone().unwrap_or_default(),
            record.tracking_type.map(|t| t.to_string()).unwrap_or_default(),
            record
                .address
                .as_deref()
                .map(|a| a.lines().collect::<Vec<_>>().join(" / "))
                .unwrap_or_default(),
            record.confidence_status.to_string(),
            record.iso_key.map(String::from).unwrap_or_default(),
            record.ocr_key.map(String::from).unwrap_or_default(),
            record
                .image_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            record.captured_at.to_rfc3339(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ReplayReport) -> String {
    let mut output = String::new();

    for (i, record) in report.records.iter().enumerate() {
        output.push_str(&format!(
            "Record {}: {} [{}]\n",
            i + 1,
            record.tracking_number.as_deref().unwrap_or("-"),
            record.confidence_status
        ));
        if let Some(address) = &record.address {
            for line in address.lines() {
                output.push_str(&format!("  {}\n", line));
            }
        }
    }

    for observation in &report.returned {
        output.push_str(&format!(
            "Returned: {}\n",
            observation.tracking_number.as_deref().unwrap_or("-")
        ));
        if let Some(address) = &observation.raw_address_text {
            for line in address.lines() {
                output.push_str(&format!("  {}\n", line));
            }
        }
    }

    for number in &report.duplicates {
        output.push_str(&format!("Duplicate: {}\n", number));
    }

    output
}
