//! Turning one frame's recognizer output into an observation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{select_barcode, BarcodeDetection, BarcodeFormat, Frame, Rect, RecognizedText};
use crate::address::{AddressExtractor, ExclusionZones};
use crate::error::Result;
use crate::models::config::{AvpConfig, ZoneConfig};
use crate::models::scan::ScannedObservation;
use crate::tracking::TrackingResolver;

const PREVIEW_LINES: usize = 3;

/// What the capture screen can show while scanning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveDetection {
    /// Raw value of the barcode in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,

    /// First lines of the recognized text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,

    /// Kept text blocks, normalized to [0, 1] by frame size.
    #[serde(default)]
    pub regions: Vec<Rect>,
}

/// Result of analyzing one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub observation: ScannedObservation,
    pub live: LiveDetection,
}

/// Resolves tracking and address from recognizer output.
#[derive(Debug, Clone, Default)]
pub struct FrameInterpreter {
    resolver: TrackingResolver,
    extractor: AddressExtractor,
    zones: ZoneConfig,
}

impl FrameInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AvpConfig) -> Self {
        Self {
            resolver: TrackingResolver::new(),
            extractor: AddressExtractor::with_config(config.address.clone()),
            zones: config.zones.clone(),
        }
    }

    /// Build the frame observation.
    ///
    /// An empty detection list or empty text simply leaves the matching
    /// fields absent.
    pub fn interpret(
        &self,
        frame: &Frame,
        detections: &[BarcodeDetection],
        text: &RecognizedText,
    ) -> Result<FrameAnalysis> {
        let chosen = select_barcode(detections);
        let raw = chosen.map_or("", |d| d.raw_value.as_str());
        let is_data_matrix = chosen.is_some_and(|d| d.format == BarcodeFormat::DataMatrix);

        let resolution = self.resolver.resolve(raw, is_data_matrix, &text.text)?;

        let zones = (self.zones.enabled && frame.has_geometry()).then(|| {
            ExclusionZones::new(
                frame.width,
                frame.height,
                chosen.and_then(|d| d.bounds),
                &self.zones,
            )
        });
        let extraction = self.extractor.extract(text, zones.as_ref());

        debug!(
            "Frame: barcode={:?} tracking={:?} address_mode={:?}",
            chosen.map(|d| d.format),
            resolution.as_ref().map(|r| r.tracking_number.as_str()),
            extraction.mode
        );

        let mut observation = ScannedObservation {
            raw_address_text: extraction.address,
            image_path: frame.image_path.clone(),
            ..Default::default()
        };
        if let Some(resolution) = resolution {
            observation.tracking_number = Some(resolution.tracking_number);
            observation.tracking_type = Some(resolution.tracking_type);
            observation.iso_key = resolution.iso_key;
            observation.ocr_key = resolution.ocr_key;
            observation.confidence_status = resolution.status;
        }

        let regions = if frame.has_geometry() {
            extraction
                .regions
                .iter()
                .map(|r| r.normalized(frame.width, frame.height))
                .collect()
        } else {
            Vec::new()
        };

        Ok(FrameAnalysis {
            observation,
            live: LiveDetection {
                barcode: chosen.map(|d| d.raw_value.clone()),
                preview: text.preview(PREVIEW_LINES),
                regions,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::{TrackingType, ValidationStatus};
    use crate::ocr::TextBlock;
    use pretty_assertions::assert_eq;

    fn notice_text() -> RecognizedText {
        RecognizedText::from_blocks(vec![
            TextBlock::from_lines(["AVIS DE PASSAGE"], Some(Rect::new(50.0, 20.0, 400.0, 60.0))),
            TextBlock::from_lines(
                ["MME DUPONT", "12 RUE DE PARIS", "75001 PARIS"],
                Some(Rect::new(60.0, 400.0, 300.0, 490.0)),
            ),
            TextBlock::from_lines(
                ["SD : 86912345678901 U"],
                Some(Rect::new(700.0, 500.0, 950.0, 530.0)),
            ),
        ])
    }

    #[test]
    fn test_full_frame() {
        let frame = Frame::new(1000, 1000).with_image_path("/tmp/frame-1.jpg");
        let detections = vec![
            BarcodeDetection::new(BarcodeFormat::Qr, "https://laposte.fr"),
            BarcodeDetection::new(BarcodeFormat::DataMatrix, "%123456786912345678901")
                .with_bounds(Rect::new(650.0, 400.0, 800.0, 550.0)),
        ];

        let analysis = FrameInterpreter::new()
            .interpret(&frame, &detections, &notice_text())
            .unwrap();
        let obs = &analysis.observation;

        assert_eq!(obs.tracking_number.as_deref(), Some("86912345678901U"));
        assert_eq!(obs.tracking_type, Some(TrackingType::SmartdataDatamatrix));
        assert_eq!(obs.confidence_status, ValidationStatus::Verified);
        assert_eq!(obs.ocr_key, Some('U'));
        assert_eq!(
            obs.raw_address_text.as_deref(),
            Some("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS")
        );
        assert_eq!(obs.image_path, frame.image_path);

        assert_eq!(analysis.live.barcode.as_deref(), Some("%123456786912345678901"));
        assert_eq!(
            analysis.live.preview.as_deref(),
            Some("AVIS DE PASSAGE\nMME DUPONT\n12 RUE DE PARIS")
        );
        assert_eq!(analysis.live.regions, vec![Rect::new(0.06, 0.4, 0.3, 0.49)]);
    }

    #[test]
    fn test_empty_frame_is_not_an_error() {
        let analysis = FrameInterpreter::new()
            .interpret(&Frame::default(), &[], &RecognizedText::default())
            .unwrap();
        assert_eq!(analysis, FrameAnalysis::default());
    }
}
