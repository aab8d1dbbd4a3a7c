//! Recipient address extraction.
//!
//! Works in two modes: block geometry when the text engine reports
//! positioned blocks, and flat text otherwise (or when no block carries a
//! postal anchor).

pub mod blocks;
mod flat;
pub mod patterns;
mod zones;

pub use flat::extract_from_text;
pub use zones::ExclusionZones;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::config::AddressConfig;
use crate::ocr::{Rect, RecognizedText, TextBlock};

/// Which path produced the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    Blocks,
    Flat,
}

/// Result of running the extractor over one frame's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressExtraction {
    /// Assembled address, if one was found.
    pub address: Option<String>,

    pub mode: ExtractionMode,

    /// Bounds of the blocks that survived the zone filter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Rect>,
}

/// Address extractor over recognized text.
#[derive(Debug, Clone, Default)]
pub struct AddressExtractor {
    config: AddressConfig,
}

impl AddressExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AddressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AddressConfig {
        &self.config
    }

    /// Flat-text extraction.
    pub fn extract_from_text(&self, text: &str) -> Option<String> {
        extract_from_text(text)
    }

    /// Extract the address from recognized text.
    ///
    /// `zones`, when given, drops blocks lying in non-address regions before
    /// scoring.
    pub fn extract(&self, text: &RecognizedText, zones: Option<&ExclusionZones>) -> AddressExtraction {
        if text.blocks.is_empty() {
            return self.flat(text, Vec::new());
        }

        let kept: Vec<&TextBlock> = match zones {
            Some(zones) => zones.filter(&text.blocks),
            None => text.blocks.iter().collect(),
        };
        let regions: Vec<Rect> = kept.iter().filter_map(|b| b.bounds).collect();

        if kept.len() < text.blocks.len() {
            debug!(
                "Zone filter kept {} of {} blocks",
                kept.len(),
                text.blocks.len()
            );
        }

        let candidates = blocks::candidates(&kept, &self.config);
        if candidates.is_empty() {
            debug!("No anchored block, falling back to flat text");
            return self.flat(text, regions);
        }

        let Some(primary) = blocks::select_primary(&candidates) else {
            info!("Every anchored block was disqualified");
            return AddressExtraction {
                address: None,
                mode: ExtractionMode::Blocks,
                regions,
            };
        };

        debug!(
            "Selected block {} with score {}",
            primary.index, primary.score
        );

        let body = blocks::extract_lines(primary.block, primary.anchor);
        let address = match blocks::find_header(&kept, primary.index, &self.config) {
            Some(header) => format!("{}\n{}", header.text.trim(), body),
            None => body,
        };

        AddressExtraction {
            address: Some(address),
            mode: ExtractionMode::Blocks,
            regions,
        }
    }

    fn flat(&self, text: &RecognizedText, regions: Vec<Rect>) -> AddressExtraction {
        let address = if text.text.trim().is_empty() && !text.blocks.is_empty() {
            let rebuilt = text
                .blocks
                .iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            extract_from_text(&rebuilt)
        } else {
            extract_from_text(&text.text)
        };

        AddressExtraction {
            address,
            mode: ExtractionMode::Flat,
            regions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ZoneConfig;
    use pretty_assertions::assert_eq;

    fn block(lines: &[&str], left: f32, top: f32, right: f32, bottom: f32) -> TextBlock {
        TextBlock::from_lines(lines.iter().copied(), Some(Rect::new(left, top, right, bottom)))
    }

    #[test]
    fn test_header_block_merged() {
        let text = RecognizedText::from_blocks(vec![
            block(&["MME DUPONT"], 100.0, 400.0, 300.0, 430.0),
            block(&["12 RUE DE PARIS", "75001 PARIS", "FRANCE"], 100.0, 440.0, 320.0, 530.0),
        ]);

        let result = AddressExtractor::new().extract(&text, None);
        assert_eq!(result.mode, ExtractionMode::Blocks);
        assert_eq!(
            result.address.as_deref(),
            Some("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS\nFRANCE")
        );
    }

    #[test]
    fn test_contiguous_flat_text() {
        let text = RecognizedText::flat("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS\nFRANCE");
        let result = AddressExtractor::new().extract(&text, None);
        assert_eq!(result.mode, ExtractionMode::Flat);
        assert_eq!(
            result.address.as_deref(),
            Some("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS\nFRANCE")
        );
    }

    #[test]
    fn test_sender_block_only_yields_nothing() {
        let text = RecognizedText::from_blocks(vec![block(
            &["RETOUR EXPEDITEUR", "BP 40", "33000 BORDEAUX"],
            100.0,
            400.0,
            300.0,
            490.0,
        )]);

        let result = AddressExtractor::new().extract(&text, None);
        assert_eq!(result.address, None);
        assert_eq!(result.mode, ExtractionMode::Blocks);
    }

    #[test]
    fn test_sender_block_not_used_as_header() {
        let text = RecognizedText::from_blocks(vec![
            block(&["RETOUR EXPEDITEUR"], 100.0, 400.0, 300.0, 430.0),
            block(&["M. MARTIN", "4 AVENUE FOCH", "69002 LYON"], 100.0, 440.0, 320.0, 530.0),
        ]);

        let result = AddressExtractor::new().extract(&text, None);
        assert_eq!(
            result.address.as_deref(),
            Some("M. MARTIN\n4 AVENUE FOCH\n69002 LYON")
        );
    }

    #[test]
    fn test_higher_score_wins_over_order() {
        let text = RecognizedText::from_blocks(vec![
            block(&["33000 BORDEAUX"], 100.0, 300.0, 300.0, 330.0),
            block(&["MME DUPONT", "12 RUE DE PARIS", "75001 PARIS"], 100.0, 500.0, 320.0, 590.0),
        ]);

        let result = AddressExtractor::new().extract(&text, None);
        assert_eq!(
            result.address.as_deref(),
            Some("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS")
        );
    }

    #[test]
    fn test_no_anchor_falls_back_to_flat() {
        let text = RecognizedText::from_blocks(vec![
            block(&["AVIS DE PASSAGE"], 100.0, 300.0, 300.0, 330.0),
            block(&["MME DUPONT", "12 RUE"], 100.0, 400.0, 300.0, 460.0),
        ]);

        let result = AddressExtractor::new().extract(&text, None);
        assert_eq!(result.mode, ExtractionMode::Flat);
        assert_eq!(
            result.address.as_deref(),
            Some("AVIS DE PASSAGE\nMME DUPONT\n12 RUE")
        );
    }

    #[test]
    fn test_zone_filter_drops_sender_corner() {
        let zones = ExclusionZones::new(1000, 1000, None, &ZoneConfig::default());
        let text = RecognizedText::from_blocks(vec![
            block(&["LA POSTE", "33000 BORDEAUX"], 10.0, 160.0, 200.0, 220.0),
            block(&["MME DUPONT", "12 RUE DE PARIS", "75001 PARIS"], 20.0, 400.0, 320.0, 490.0),
        ]);

        let result = AddressExtractor::new().extract(&text, Some(&zones));
        assert_eq!(result.regions.len(), 1);
        assert_eq!(
            result.address.as_deref(),
            Some("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS")
        );
    }
}
