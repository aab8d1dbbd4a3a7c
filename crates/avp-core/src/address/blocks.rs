//! Address extraction from positioned text blocks.
//!
//! Each block holding a postal anchor near its end is scored on structure;
//! the best one becomes the address body and a name block sitting right
//! above it may be merged in as a header.

use tracing::debug;

use super::patterns::{is_country_line, is_postal_line, CIVILITY, FORBIDDEN};
use crate::models::config::AddressConfig;
use crate::ocr::TextBlock;

/// Where the postal anchor sits inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Index of the postal-code + city line.
    pub line: usize,
    /// Index of a "FRANCE" line right after it.
    pub country_line: Option<usize>,
}

impl Anchor {
    /// Last line index that belongs to the address.
    pub fn last_line(&self) -> usize {
        self.country_line.unwrap_or(self.line)
    }
}

/// A block that carries an anchor, with its score.
#[derive(Debug, Clone, Copy)]
pub struct BlockCandidate<'a> {
    pub index: usize,
    pub block: &'a TextBlock,
    pub anchor: Anchor,
    pub score: i32,
    pub disqualified: bool,
}

/// Search the trailing `depth` lines of a block, last line first.
pub fn find_anchor(block: &TextBlock, depth: usize) -> Option<Anchor> {
    let lines = &block.lines;
    let start = lines.len().saturating_sub(depth);

    for i in (start..lines.len()).rev() {
        let text = lines[i].text.as_str();

        if is_country_line(text) {
            if i > 0 && is_postal_line(&lines[i - 1].text) {
                return Some(Anchor { line: i - 1, country_line: Some(i) });
            }
            continue;
        }

        if is_postal_line(text) {
            let country_line = lines
                .get(i + 1)
                .filter(|next| is_country_line(&next.text))
                .map(|_| i + 1);
            return Some(Anchor { line: i, country_line });
        }
    }

    None
}

fn block_text(block: &TextBlock) -> String {
    if block.lines.is_empty() {
        block.text.clone()
    } else {
        block
            .lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Whether a block mentions sender, return or business-routing markers.
pub fn has_forbidden_keyword(block: &TextBlock) -> bool {
    FORBIDDEN.is_match(&block_text(block))
}

/// Whether a block mentions a civility or company marker.
pub fn has_civility_keyword(block: &TextBlock) -> bool {
    CIVILITY.is_match(&block_text(block))
}

/// Score a block's likelihood of being the recipient address.
///
/// Returns the score and whether a forbidden keyword disqualified it.
pub fn score_block(block: &TextBlock, config: &AddressConfig) -> (i32, bool) {
    let mut score = config.base_score;

    if has_civility_keyword(block) {
        score += config.civility_bonus;
    }

    if let Some(bounds) = block.bounds {
        let bonus = (bounds.height().max(0.0) * config.height_bonus_per_px) as i32;
        score += bonus.min(config.max_height_bonus);
    }

    let line_count = block.lines.len();
    if (3..=6).contains(&line_count) {
        score += config.line_count_bonus;
    }
    if line_count < 2 {
        score -= config.short_block_penalty;
    }

    let disqualified = has_forbidden_keyword(block);
    if disqualified {
        score -= config.forbidden_penalty;
    }

    (score, disqualified)
}

/// Anchored blocks in input order.
pub fn candidates<'a>(blocks: &[&'a TextBlock], config: &AddressConfig) -> Vec<BlockCandidate<'a>> {
    blocks
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, b)| !b.lines.is_empty())
        .filter_map(|(index, block)| {
            let anchor = find_anchor(block, config.anchor_search_depth)?;
            let (score, disqualified) = score_block(block, config);
            Some(BlockCandidate { index, block, anchor, score, disqualified })
        })
        .collect()
}

/// Highest-scoring eligible candidate; the first one wins a tie.
///
/// Disqualified or non-positive candidates are never chosen.
pub fn select_primary<'a>(candidates: &[BlockCandidate<'a>]) -> Option<BlockCandidate<'a>> {
    let mut best: Option<BlockCandidate<'a>> = None;

    for candidate in candidates {
        if candidate.disqualified || candidate.score <= 0 {
            debug!(
                "Skipping block {} (score {}, disqualified {})",
                candidate.index, candidate.score, candidate.disqualified
            );
            continue;
        }
        if best.as_ref().is_none_or(|b| candidate.score > b.score) {
            best = Some(*candidate);
        }
    }

    best
}

/// Find the name block directly above the primary block.
pub fn find_header<'a>(
    blocks: &[&'a TextBlock],
    primary_index: usize,
    config: &AddressConfig,
) -> Option<&'a TextBlock> {
    let primary = blocks.get(primary_index)?;
    let primary_box = primary.bounds?;
    let line_height = primary.line_height()?;
    let max_gap = line_height * config.header_max_gap_lines;

    let mut best: Option<(&'a TextBlock, f32)> = None;

    for (index, other) in blocks.iter().enumerate() {
        if index == primary_index || other.text.trim().is_empty() {
            continue;
        }
        let Some(other_box) = other.bounds else {
            continue;
        };

        let gap = primary_box.top - other_box.bottom;
        if gap < 0.0 || gap > max_gap {
            continue;
        }

        let left_diff = (other_box.left - primary_box.left).abs();
        let overlap = other_box.horizontal_overlap(&primary_box);
        let aligned = left_diff <= config.left_align_tolerance_px
            || (other_box.width() > 0.0
                && overlap >= other_box.width() * config.min_overlap_ratio)
            || (has_civility_keyword(other) && left_diff <= config.civility_align_tolerance_px);

        if !aligned {
            continue;
        }

        if best.is_none_or(|(_, best_gap)| gap < best_gap) {
            best = Some((*other, gap));
        }
    }

    let (header, gap) = best?;
    if has_forbidden_keyword(header) {
        debug!("Rejecting header block with forbidden keyword");
        return None;
    }

    debug!("Merging header block {:.0}px above address", gap);
    Some(header)
}

/// Lines 0 through the anchor (and country line) of a block.
pub fn extract_lines(block: &TextBlock, anchor: Anchor) -> String {
    block.lines[..=anchor.last_line()]
        .iter()
        .map(|l| l.text.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
