//! Configuration structures for the scanning core.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AvpError, Result};

/// Main configuration for the avp core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvpConfig {
    /// Scan session configuration.
    pub scan: ScanConfig,

    /// Address block heuristics.
    pub address: AddressConfig,

    /// Exclusion-zone pre-filter.
    pub zones: ZoneConfig,
}

/// Which completeness rule a session applies, and what happens on finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// One full capture, then the session ends.
    Single,
    /// Full captures, one after another.
    #[default]
    Bulk,
    /// Re-capture of the tracking number only, returned to the caller.
    ReturnTracking,
    /// Re-capture of the address only, returned to the caller.
    ReturnAddress,
    /// Full re-capture returned to the caller.
    ReturnAll,
}

impl ScanMode {
    /// Return modes hand the result back instead of persisting it.
    pub fn is_return(&self) -> bool {
        matches!(
            self,
            ScanMode::ReturnTracking | ScanMode::ReturnAddress | ScanMode::ReturnAll
        )
    }
}

/// Scan session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Completeness rule and finalize behavior.
    pub mode: ScanMode,

    /// Quiet period after completeness before an automatic finalize (0 = none).
    pub stability_delay_ms: u64,

    /// Keep scanning after a saved record in bulk mode.
    pub continuous: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Bulk,
            stability_delay_ms: 500,
            continuous: true,
        }
    }
}

/// Address block scoring and header-merge constants.
///
/// These were tuned against one label layout; treat them as knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressConfig {
    /// How many trailing lines of a block are searched for the postal anchor.
    pub anchor_search_depth: usize,

    /// Score every anchored block starts with.
    pub base_score: i32,

    /// Bonus when a civility keyword appears.
    pub civility_bonus: i32,

    /// Bonus per pixel of block height.
    pub height_bonus_per_px: f32,

    /// Upper bound on the height bonus.
    pub max_height_bonus: i32,

    /// Bonus when the block has between 3 and 6 lines.
    pub line_count_bonus: i32,

    /// Penalty when the block has fewer than 2 lines.
    pub short_block_penalty: i32,

    /// Penalty when a forbidden keyword appears (disqualifies the block).
    pub forbidden_penalty: i32,

    /// Maximum header gap, in primary line-heights.
    pub header_max_gap_lines: f32,

    /// Left-edge alignment tolerance in pixels.
    pub left_align_tolerance_px: f32,

    /// Left-edge tolerance when the candidate header has a civility keyword.
    pub civility_align_tolerance_px: f32,

    /// Minimum horizontal overlap as a fraction of the header width.
    pub min_overlap_ratio: f32,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            anchor_search_depth: 4,
            base_score: 100,
            civility_bonus: 50,
            height_bonus_per_px: 0.1,
            max_height_bonus: 30,
            line_count_bonus: 20,
            short_block_penalty: 30,
            forbidden_penalty: 500,
            header_max_gap_lines: 4.0,
            left_align_tolerance_px: 50.0,
            civility_align_tolerance_px: 150.0,
            min_overlap_ratio: 0.5,
        }
    }
}

/// Regions of a notice image that never hold the recipient address.
///
/// All values are fractions of the frame width or height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Apply the pre-filter when frame geometry is known.
    pub enabled: bool,

    /// Indexing marks band at the top.
    pub top_band: f32,

    /// Postal barcoding band at the bottom.
    pub bottom_band: f32,

    /// Right-hand share of the frame excluded when no barcode was located.
    pub right_fraction: f32,

    /// Width of the sender corner, top-left.
    pub sender_width: f32,

    /// Height of the sender corner, top-left.
    pub sender_height: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_band: 0.15,
            bottom_band: 0.10,
            right_fraction: 2.0 / 3.0,
            sender_width: 0.25,
            sender_height: 0.25,
        }
    }
}

impl AvpConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AvpError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
