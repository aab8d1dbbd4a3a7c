//! Address command - extract the recipient address from recognized text.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use avp_core::{AddressExtractor, ExclusionZones, Rect, RecognizedText};

use super::load_config;

/// Arguments for the address command.
#[derive(Args)]
pub struct AddressArgs {
    /// Recognized text: JSON (text + blocks) or plain text
    input: PathBuf,

    /// Frame width in pixels, enables the exclusion-zone filter with --height
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Left edge of the detected barcode, in pixels
    #[arg(long)]
    barcode_left: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: AddressArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = fs::read_to_string(&args.input)?;
    let text = parse_recognized_text(&content);
    debug!(
        "Loaded {} block(s), {} bytes of text",
        text.blocks.len(),
        text.text.len()
    );

    let zones = match (args.width, args.height) {
        (Some(width), Some(height)) if config.zones.enabled => {
            let barcode = args
                .barcode_left
                .map(|left| Rect::new(left, 0.0, width as f32, height as f32));
            Some(ExclusionZones::new(width, height, barcode, &config.zones))
        }
        _ => None,
    };

    let extraction = AddressExtractor::with_config(config.address).extract(&text, zones.as_ref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    match extraction.address {
        Some(address) => {
            println!("{}", address);
            eprintln!(
                "{} {:?} mode, {} region(s) kept",
                style("ℹ").blue(),
                extraction.mode,
                extraction.regions.len()
            );
            Ok(())
        }
        None => anyhow::bail!("No address found"),
    }
}

/// JSON recognizer output when it parses as such, plain text otherwise.
fn parse_recognized_text(content: &str) -> RecognizedText {
    match serde_json::from_str::<RecognizedText>(content) {
        Ok(mut text) => {
            if text.text.trim().is_empty() && !text.blocks.is_empty() {
                text = RecognizedText::from_blocks(text.blocks);
            }
            text
        }
        Err(_) => RecognizedText::flat(content),
    }
}
