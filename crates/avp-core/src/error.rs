//! Error types for the avp-core library.

use thiserror::Error;

/// Main error type for the avp library.
#[derive(Error, Debug)]
pub enum AvpError {
    /// A checksum function received a character outside its alphabet.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ChecksumError),

    /// Scan session error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by the check-character functions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChecksumError {
    /// Character is not in the MOD 37-36 alphabet (0-9, A-Z).
    #[error("character {0:?} is not in the ISO 7064 alphabet")]
    InvalidCharacter(char),

    /// Character is not an ASCII digit.
    #[error("character {0:?} is not a digit")]
    InvalidDigit(char),
}

/// Errors related to a scanning session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session already holds a record with this tracking number.
    #[error("duplicate observation: {tracking_number} already recorded in this session")]
    Duplicate { tracking_number: String },

    /// The session task has stopped and no longer accepts frames.
    #[error("session is closed")]
    Closed,
}

/// Errors reported by external recognition engines.
///
/// These never leave the frame analyzer: a failed engine is treated as having
/// produced nothing for that frame.
#[derive(Error, Debug, Clone)]
pub enum RecognitionError {
    /// Barcode engine failure.
    #[error("barcode recognition failed: {0}")]
    Barcode(String),

    /// Text engine failure.
    #[error("text recognition failed: {0}")]
    Text(String),
}

/// Result type for the avp library.
pub type Result<T> = std::result::Result<T, AvpError>;
