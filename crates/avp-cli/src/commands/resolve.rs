//! Resolve command - reconcile barcode content with OCR text.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use avp_core::{TrackingResolution, TrackingResolver};

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    /// Raw barcode content (empty string for none)
    raw: String,

    /// The content was read from a DataMatrix symbol
    #[arg(short, long)]
    datamatrix: bool,

    /// OCR text of the frame
    #[arg(long, conflicts_with = "ocr_file")]
    ocr: Option<String>,

    /// File holding the OCR text of the frame
    #[arg(long)]
    ocr_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ResolveArgs) -> anyhow::Result<()> {
    let ocr_text = match (&args.ocr, &args.ocr_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => String::new(),
    };

    info!(
        "Resolving {:?} (datamatrix: {}, {} bytes of OCR text)",
        args.raw,
        args.datamatrix,
        ocr_text.len()
    );

    let resolution = TrackingResolver::new().resolve(&args.raw, args.datamatrix, &ocr_text)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    match resolution {
        Some(resolution) => print_resolution(&resolution),
        None => anyhow::bail!("No tracking number could be resolved"),
    }

    Ok(())
}

fn print_resolution(resolution: &TrackingResolution) {
    let status = match resolution.status {
        avp_core::ValidationStatus::Verified => style(resolution.status.to_string()).green(),
        avp_core::ValidationStatus::Warning => style(resolution.status.to_string()).yellow(),
        avp_core::ValidationStatus::Calculated => style(resolution.status.to_string()).blue(),
    };

    println!("Tracking number: {}", resolution.tracking_number);
    println!("Type:            {}", resolution.tracking_type);
    println!("Status:          {}", status);
    if let Some(key) = resolution.iso_key {
        println!("ISO key:         {}", key);
    }
    if let Some(key) = resolution.ocr_key {
        println!("OCR key:         {}", key);
    }
}
