//! Persistence seam for finalized records.

use crate::error::Result;
use crate::models::scan::FinalizedRecord;

/// Where a session sends finalized records.
///
/// Implementations own session association and storage; the core only
/// asks whether a tracking number is already present and hands records over.
pub trait RecordStore {
    /// Whether a record with this tracking number exists in the current session.
    fn contains_tracking(&self, tracking_number: &str) -> bool;

    /// Persist a record.
    fn save(&mut self, record: FinalizedRecord) -> Result<()>;
}

/// In-memory store keeping records in capture order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<FinalizedRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[FinalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<FinalizedRecord> {
        self.records
    }
}

impl RecordStore for MemoryStore {
    fn contains_tracking(&self, tracking_number: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.tracking_number.as_deref() == Some(tracking_number))
    }

    fn save(&mut self, record: FinalizedRecord) -> Result<()> {
        self.records.push(record);
        Ok(())
    }
}
