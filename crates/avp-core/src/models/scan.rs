//! Scan observation and finalized record models.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of symbol the tracking number was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingType {
    /// Linear barcode (Code 128, UPU S10 labels, ...).
    #[serde(rename = "barcode_1d")]
    Barcode1D,
    /// SmartData DataMatrix carrying a structured payload.
    SmartdataDatamatrix,
    /// Source could not be determined.
    Unknown,
}

impl fmt::Display for TrackingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingType::Barcode1D => write!(f, "BARCODE_1D"),
            TrackingType::SmartdataDatamatrix => write!(f, "SMARTDATA_DATAMATRIX"),
            TrackingType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How far the check character of a tracking number has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// A check character read by OCR matches the computed one.
    Verified,
    /// A check character was read but disagrees with the computed one.
    Warning,
    /// Nothing was read; the computed check character is used unconfirmed.
    #[default]
    Calculated,
}

impl ValidationStatus {
    /// Derive the status from a computed ISO key and an OCR-read key.
    pub fn from_keys(iso_key: Option<char>, ocr_key: Option<char>) -> Self {
        match (ocr_key, iso_key) {
            (Some(ocr), Some(iso)) if ocr == iso => ValidationStatus::Verified,
            (Some(_), _) => ValidationStatus::Warning,
            (None, _) => ValidationStatus::Calculated,
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Verified => write!(f, "VERIFIED"),
            ValidationStatus::Warning => write!(f, "WARNING"),
            ValidationStatus::Calculated => write!(f, "CALCULATED"),
        }
    }
}

/// What a single camera frame contributed.
///
/// Observations are values: the accumulator merges them into a new
/// observation instead of mutating one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannedObservation {
    /// Resolved tracking number (14 digits + check character, or a raw match).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,

    /// Symbol the tracking number came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_type: Option<TrackingType>,

    /// Extracted recipient address block, one line per address line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_address_text: Option<String>,

    /// ISO 7064 MOD 37-36 key computed over the first 14 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_key: Option<char>,

    /// Check character read from the printed label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_key: Option<char>,

    /// Confirmation level of the tracking number.
    pub confidence_status: ValidationStatus,

    /// Where the frame image was stored, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
}

impl ScannedObservation {
    /// Whether the observation carries a non-blank tracking number.
    pub fn has_tracking(&self) -> bool {
        self.tracking_number
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Whether the observation carries a non-blank address.
    pub fn has_address(&self) -> bool {
        self.raw_address_text
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }

    /// Number of lines in the address block (0 when absent).
    pub fn address_line_count(&self) -> usize {
        self.raw_address_text
            .as_deref()
            .map(|a| a.lines().count())
            .unwrap_or(0)
    }

    /// Whether the tracking number came from a SmartData label.
    pub fn is_smartdata(&self) -> bool {
        self.tracking_type == Some(TrackingType::SmartdataDatamatrix)
    }

    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }
}

/// A finalized capture handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_type: Option<TrackingType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub confidence_status: ValidationStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_key: Option<char>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_key: Option<char>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,

    /// When the record was finalized.
    pub captured_at: DateTime<Utc>,
}

impl FinalizedRecord {
    /// Build a record from a finalized observation, stamped now.
    pub fn from_observation(observation: ScannedObservation) -> Self {
        Self::from_observation_at(observation, Utc::now())
    }

    /// Build a record from a finalized observation with an explicit timestamp.
    pub fn from_observation_at(observation: ScannedObservation, captured_at: DateTime<Utc>) -> Self {
        Self {
            tracking_number: observation.tracking_number,
            tracking_type: observation.tracking_type,
            address: observation.raw_address_text,
            confidence_status: observation.confidence_status,
            iso_key: observation.iso_key,
            ocr_key: observation.ocr_key,
            image_path: observation.image_path,
            captured_at,
        }
    }
}
