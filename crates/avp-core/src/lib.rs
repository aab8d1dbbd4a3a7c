//! Core library for postal delivery-notice scanning.
//!
//! This crate provides:
//! - Tracking number check characters (ISO 7064 MOD 37-36, La Poste mod 10)
//! - Barcode / DataMatrix payload extraction reconciled with the printed label
//! - Recipient address extraction from positioned OCR blocks or flat text
//! - Frame accumulation and scan session lifecycle

pub mod address;
pub mod error;
pub mod models;
pub mod ocr;
pub mod scan;
pub mod tracking;

pub use error::{AvpError, ChecksumError, RecognitionError, Result, SessionError};
pub use models::config::{AddressConfig, AvpConfig, ScanConfig, ScanMode, ZoneConfig};
pub use models::scan::{FinalizedRecord, ScannedObservation, TrackingType, ValidationStatus};
pub use address::{AddressExtraction, AddressExtractor, ExclusionZones, ExtractionMode};
pub use ocr::{
    BarcodeDetection, BarcodeFormat, Frame, FrameAnalysis, FrameInterpreter, LiveDetection, Rect,
    RecognizedText, TextBlock, TextLine,
};
#[cfg(feature = "native")]
pub use ocr::{cancel_pair, BarcodeReader, CancelHandle, CancelToken, FrameAnalyzer, TextReader};
pub use scan::{FrameAccumulator, MemoryStore, RecordStore, SessionCore, SessionEvent};
#[cfg(feature = "native")]
pub use scan::{ScanSession, SessionHandle};
pub use tracking::{iso_key, la_poste_key, CheckScheme, TrackingResolution, TrackingResolver};
