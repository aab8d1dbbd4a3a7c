//! Data models.

pub mod config;
pub mod scan;

pub use config::{AddressConfig, AvpConfig, ScanConfig, ScanMode, ZoneConfig};
pub use scan::{FinalizedRecord, ScannedObservation, TrackingType, ValidationStatus};
