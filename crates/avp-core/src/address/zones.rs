//! Exclusion zones of a delivery notice.
//!
//! Blocks whose center falls inside a zone are dropped before address
//! extraction: indexing marks along the top, the postal barcode band at
//! the bottom, the sender corner and everything right of the barcode.

use crate::models::config::ZoneConfig;
use crate::ocr::{Rect, TextBlock};

/// Zones resolved against one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionZones {
    width: f32,
    height: f32,
    right_edge: f32,
    config: ZoneConfig,
}

impl ExclusionZones {
    /// Resolve zones for a frame, given where the barcode was located.
    ///
    /// Without a barcode position the right-hand share of the frame set by
    /// `right_fraction` is excluded instead.
    pub fn new(width: u32, height: u32, barcode: Option<Rect>, config: &ZoneConfig) -> Self {
        let width = width as f32;
        let height = height as f32;
        let right_edge = match barcode {
            Some(rect) => rect.left,
            None => width * (1.0 - config.right_fraction),
        };

        Self {
            width,
            height,
            right_edge,
            config: config.clone(),
        }
    }

    /// Whether a point lies in an excluded zone.
    pub fn excludes_point(&self, x: f32, y: f32) -> bool {
        let c = &self.config;

        y < self.height * c.top_band
            || y > self.height * (1.0 - c.bottom_band)
            || x >= self.right_edge
            || (x < self.width * c.sender_width && y < self.height * c.sender_height)
    }

    /// Whether a block is excluded. Blocks without geometry are kept.
    pub fn excludes(&self, block: &TextBlock) -> bool {
        match block.bounds {
            Some(bounds) => {
                let (x, y) = bounds.center();
                self.excludes_point(x, y)
            }
            None => false,
        }
    }

    /// Blocks that survive the filter, in input order.
    pub fn filter<'a>(&self, blocks: &'a [TextBlock]) -> Vec<&'a TextBlock> {
        blocks.iter().filter(|b| !self.excludes(b)).collect()
    }
}
