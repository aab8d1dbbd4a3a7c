//! Tracking number extraction, check characters and barcode/OCR reconciliation.

pub mod checksum;
pub mod patterns;
mod resolver;

pub use checksum::{
    iso_key, la_poste_key, smartdata_key, validate_tracking_number, CheckScheme,
};
pub use resolver::{
    extract_from_ocr_label, extract_smartdata_payload, is_likely_tracking_number,
    parse_barcode, BarcodeTracking, SdLabelExtractor, TrackingResolution, TrackingResolver,
};

/// Trait for field extractors working over OCR text.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value found in text, with the text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            source: source.into(),
        }
    }
}
