//! Recognizer output types and the recognizer seam.
//!
//! The barcode and text engines are external; this module only fixes the
//! shape of what they hand back and how a frame is analyzed with them.

mod analysis;
#[cfg(feature = "native")]
mod recognizer;

pub use analysis::{FrameAnalysis, FrameInterpreter, LiveDetection};
#[cfg(feature = "native")]
pub use recognizer::{
    cancel_pair, BarcodeReader, CancelHandle, CancelToken, FrameAnalyzer, TextReader,
};

use std::path::PathBuf;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Get the width of the rectangle.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Get the height of the rectangle.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Get the center point.
    pub fn center(&self) -> (f32, f32) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Width of the horizontal intersection with another rectangle (0 if disjoint).
    pub fn horizontal_overlap(&self, other: &Rect) -> f32 {
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        (right - left).max(0.0)
    }

    /// Scale into [0, 1] relative to a frame of the given size.
    pub fn normalized(&self, width: u32, height: u32) -> Rect {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Rect {
            left: self.left / w,
            top: self.top / h,
            right: self.right / w,
            bottom: self.bottom / h,
        }
    }
}

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
}

impl TextLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), bounds: None }
    }
}

/// A block of text lines the engine grouped together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Full block text (lines joined with newlines).
    pub text: String,

    /// Lines in reading order.
    pub lines: Vec<TextLine>,

    /// Bounding rectangle in image pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
}

impl TextBlock {
    /// Build a block from its lines, deriving the block text.
    pub fn from_lines<I, S>(lines: I, bounds: Option<Rect>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<TextLine> = lines.into_iter().map(TextLine::new).collect();
        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self { text, lines, bounds }
    }

    /// Average line height, when the block has geometry.
    pub fn line_height(&self) -> Option<f32> {
        self.bounds
            .map(|b| b.height() / self.lines.len().max(1) as f32)
    }
}

/// Output of the text engine for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizedText {
    /// Full concatenated text.
    pub text: String,

    /// Positioned blocks, when the engine provides them.
    pub blocks: Vec<TextBlock>,
}

impl RecognizedText {
    /// Text without block geometry.
    pub fn flat(text: impl Into<String>) -> Self {
        Self { text: text.into(), blocks: Vec::new() }
    }

    /// Blocks with the full text rebuilt from them.
    pub fn from_blocks(blocks: Vec<TextBlock>) -> Self {
        let text = blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self { text, blocks }
    }

    /// First `n` non-blank lines of the text.
    pub fn preview(&self, n: usize) -> Option<String> {
        let lines: Vec<&str> = self
            .text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .take(n)
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Symbology reported by the barcode engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    DataMatrix,
    Code128,
    Qr,
    Other,
}

/// One barcode read in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeDetection {
    pub format: BarcodeFormat,

    pub raw_value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
}

impl BarcodeDetection {
    pub fn new(format: BarcodeFormat, raw_value: impl Into<String>) -> Self {
        Self { format, raw_value: raw_value.into(), bounds: None }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Pick the detection that carries the tracking number.
///
/// QR codes are ignored. A DataMatrix wins over any linear code.
pub fn select_barcode(detections: &[BarcodeDetection]) -> Option<&BarcodeDetection> {
    detections
        .iter()
        .find(|d| d.format == BarcodeFormat::DataMatrix)
        .or_else(|| detections.iter().find(|d| d.format != BarcodeFormat::Qr))
}

/// A camera frame handed to the recognizers.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,

    /// Decoded pixels, when the capture pipeline provides them in-process.
    pub image: Option<DynamicImage>,

    /// Where the frame was written, if it was.
    pub image_path: Option<PathBuf>,

    /// Capture order within a session.
    pub sequence: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, image: None, image_path: None, sequence: 0 }
    }

    /// Wrap a decoded image.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            image: Some(image),
            image_path: None,
            sequence: 0,
        }
    }

    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Whether the frame size is known.
    pub fn has_geometry(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
