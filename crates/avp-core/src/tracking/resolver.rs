//! Barcode payload extraction and reconciliation with the printed label.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::checksum::{iso_key, smartdata_key};
use super::patterns::{GENERAL_TRACKING, SD_LABEL, SMARTDATA_HEADER, SMARTDATA_PAYLOAD, UPU_S10};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::Result;
use crate::models::scan::{TrackingType, ValidationStatus};

const PAYLOAD_LEN: usize = 14;
const FULL_LEN: usize = 15;
const POSITIONAL_MIN_LEN: usize = 22;
const POSITIONAL_OFFSET: usize = 8;

/// Tracking number read from a barcode, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeTracking {
    /// Payload + computed key for SmartData, or the raw value.
    pub value: String,
    pub tracking_type: TrackingType,
}

/// Final tracking number for a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingResolution {
    pub tracking_number: String,
    pub tracking_type: TrackingType,
    pub status: ValidationStatus,
    pub iso_key: Option<char>,
    pub ocr_key: Option<char>,
}

/// Locate the 14-digit payload inside SmartData DataMatrix content.
///
/// Tries the "%" header layout, then the fixed position (offset 8, must start
/// with "8"), then any 865/869 run in the content.
pub fn extract_smartdata_payload(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if let Some(caps) = SMARTDATA_HEADER.captures(raw) {
        debug!("SmartData payload found after % header");
        return Some(caps[1].to_string());
    }

    if raw.len() >= POSITIONAL_MIN_LEN {
        if let Some(candidate) = raw.get(POSITIONAL_OFFSET..POSITIONAL_OFFSET + PAYLOAD_LEN) {
            if candidate.starts_with('8') && candidate.chars().all(|c| c.is_ascii_digit()) {
                debug!("SmartData payload found at fixed position");
                return Some(candidate.to_string());
            }
        }
    }

    let found = SMARTDATA_PAYLOAD.find(raw).map(|m| m.as_str().to_string());
    if found.is_some() {
        debug!("SmartData payload found by range scan");
    }
    found
}

/// Whether a string looks like a standard tracking number (UPU S10 or internal).
pub fn is_likely_tracking_number(text: &str) -> bool {
    UPU_S10.is_match(text) || GENERAL_TRACKING.is_match(text)
}

/// Turn raw barcode content into a tracking number.
///
/// Structured SmartData payloads get their check character appended; other
/// content is accepted verbatim when it looks like a tracking number.
pub fn parse_barcode(raw: &str, is_data_matrix: bool) -> Result<Option<BarcodeTracking>> {
    let trimmed = raw.trim();

    if is_data_matrix {
        if let Some(payload) = extract_smartdata_payload(trimmed) {
            let key = smartdata_key(&payload)?;
            return Ok(Some(BarcodeTracking {
                value: format!("{}{}", payload, key),
                tracking_type: TrackingType::SmartdataDatamatrix,
            }));
        }
    }

    if is_likely_tracking_number(trimmed) {
        let tracking_type = if is_data_matrix {
            TrackingType::SmartdataDatamatrix
        } else {
            TrackingType::Barcode1D
        };
        return Ok(Some(BarcodeTracking {
            value: trimmed.to_string(),
            tracking_type,
        }));
    }

    Ok(None)
}

/// Extractor for the printed "SD : ..." label.
#[derive(Debug, Default)]
pub struct SdLabelExtractor;

impl SdLabelExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for SdLabelExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in SD_LABEL.captures_iter(text) {
            let compact: String = caps[1]
                .chars()
                .filter(|c| *c != ' ')
                .collect::<String>()
                .to_ascii_uppercase();

            if compact.chars().count() == FULL_LEN {
                if let Some(full_match) = caps.get(0) {
                    results.push(ExtractionMatch::new(compact, full_match.as_str()));
                }
            }
        }

        results
    }
}

/// Extract the 15-character tracking number from a printed "SD" label.
pub fn extract_from_ocr_label(text: &str) -> Option<String> {
    SdLabelExtractor::new().extract(text).map(|m| {
        debug!("Tracking label read from {:?}", m.source.trim());
        m.value
    })
}

/// Find `core` in the text followed by an optional blank and one key character.
fn find_key_after(text: &str, core: &str) -> Option<char> {
    if core.is_empty() {
        return None;
    }

    for (start, _) in text.match_indices(core) {
        let mut rest = text[start + core.len()..].chars();
        let key = match rest.next() {
            Some(c) if c.is_whitespace() => rest.next(),
            other => other,
        };
        if let Some(k) = key.filter(|k| k.is_ascii_digit() || k.is_ascii_uppercase()) {
            return Some(k);
        }
    }

    None
}

fn core14(value: &str) -> String {
    value.chars().take(PAYLOAD_LEN).collect()
}

/// Reconciles barcode reads with the OCR-read label.
#[derive(Debug, Default, Clone)]
pub struct TrackingResolver;

impl TrackingResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the tracking number of one frame.
    ///
    /// `raw_content` is the chosen barcode payload (empty when the frame had
    /// none). Returns `Ok(None)` when nothing could be resolved.
    pub fn resolve(
        &self,
        raw_content: &str,
        is_data_matrix: bool,
        ocr_full_text: &str,
    ) -> Result<Option<TrackingResolution>> {
        let barcode = parse_barcode(raw_content, is_data_matrix)?;
        let ocr_tracking = extract_from_ocr_label(ocr_full_text);

        if let Some(ocr_value) = ocr_tracking {
            let ocr_core = core14(&ocr_value);
            let ocr_key = ocr_value.chars().last();
            let iso = iso_key(&ocr_core)?;

            let (status, tracking_type) = match &barcode {
                Some(b) if core14(&b.value) == ocr_core => {
                    (ValidationStatus::Verified, b.tracking_type)
                }
                Some(b) => {
                    debug!(
                        "OCR label {} disagrees with barcode {}",
                        ocr_value, b.value
                    );
                    (ValidationStatus::Warning, b.tracking_type)
                }
                None => (ValidationStatus::Verified, TrackingType::SmartdataDatamatrix),
            };

            debug!("Tracking {} resolved from OCR label: {}", ocr_value, status);

            return Ok(Some(TrackingResolution {
                tracking_number: ocr_value,
                tracking_type,
                status,
                iso_key: Some(iso),
                ocr_key,
            }));
        }

        let Some(barcode) = barcode else {
            return Ok(None);
        };

        let core = core14(&barcode.value);
        let iso = iso_key(&core)?;

        let resolution = match find_key_after(ocr_full_text, &core) {
            Some(ocr_key) => {
                let status = if ocr_key == iso {
                    ValidationStatus::Verified
                } else {
                    ValidationStatus::Warning
                };
                TrackingResolution {
                    tracking_number: format!("{}{}", core, ocr_key),
                    tracking_type: barcode.tracking_type,
                    status,
                    iso_key: Some(iso),
                    ocr_key: Some(ocr_key),
                }
            }
            None => TrackingResolution {
                tracking_number: barcode.value,
                tracking_type: barcode.tracking_type,
                status: ValidationStatus::Calculated,
                iso_key: Some(iso),
                ocr_key: None,
            },
        };

        debug!(
            "Tracking {} resolved from barcode: {}",
            resolution.tracking_number, resolution.status
        );

        Ok(Some(resolution))
    }
}
