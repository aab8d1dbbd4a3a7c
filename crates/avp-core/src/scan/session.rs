//! Session lifecycle: finalize, duplicate check, persistence and mode exits.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::accumulator::{FrameAccumulator, Offer};
use super::store::RecordStore;
use crate::error::{Result, SessionError};
use crate::models::config::{ScanConfig, ScanMode};
use crate::models::scan::{FinalizedRecord, ScannedObservation};

/// What a session reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A frame was merged.
    Progress {
        pending: ScannedObservation,
        complete: bool,
    },
    /// A record was persisted.
    Saved { record: FinalizedRecord },
    /// Finalize was rejected: the tracking number is already recorded.
    Duplicate { tracking_number: String },
    /// Return-mode result handed back instead of persisted.
    Returned { observation: ScannedObservation },
    /// The session ended.
    Finished,
}

/// Session state machine without a runtime.
///
/// Frames are merged through the accumulator; finalized observations are
/// checked for duplicates and saved, or handed back in return modes.
#[derive(Debug)]
pub struct SessionCore<S> {
    config: ScanConfig,
    accumulator: FrameAccumulator,
    store: S,
    saved: usize,
    finished: bool,
}

impl<S: RecordStore> SessionCore<S> {
    pub fn new(config: ScanConfig, store: S) -> Self {
        Self {
            accumulator: FrameAccumulator::new(config.mode),
            config,
            store,
            saved: 0,
            finished: false,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn mode(&self) -> ScanMode {
        self.config.mode
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn pending(&self) -> Option<&ScannedObservation> {
        self.accumulator.pending()
    }

    /// Records saved during this session.
    pub fn saved_count(&self) -> usize {
        self.saved
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Ingest a frame and finalize as soon as the merged state is complete.
    pub fn ingest(&mut self, observation: ScannedObservation, manual: bool) -> Result<Vec<SessionEvent>> {
        if manual {
            return self.trigger_manual(Some(observation));
        }

        let (offer, progress) = self.offer(observation)?;
        let mut events = vec![progress];
        if offer.complete {
            events.extend(self.complete_pending()?);
        }
        Ok(events)
    }

    /// Merge a frame without finalizing.
    pub fn offer(&mut self, observation: ScannedObservation) -> Result<(Offer, SessionEvent)> {
        self.ensure_open()?;

        let offer = self.accumulator.offer(observation);
        let pending = self.accumulator.pending().cloned().unwrap_or_default();
        Ok((
            offer,
            SessionEvent::Progress {
                pending,
                complete: offer.complete,
            },
        ))
    }

    /// Finalize the pending observation if it is still complete.
    pub fn complete_pending(&mut self) -> Result<Vec<SessionEvent>> {
        self.ensure_open()?;

        match self.accumulator.finalize_if_complete() {
            Some(observation) => self.commit(observation),
            None => {
                debug!("Pending observation no longer complete, keep scanning");
                Ok(Vec::new())
            }
        }
    }

    /// Finalize everything gathered so far plus an optional last frame.
    pub fn trigger_manual(&mut self, observation: Option<ScannedObservation>) -> Result<Vec<SessionEvent>> {
        self.ensure_open()?;

        match self.accumulator.ingest(observation.unwrap_or_default(), true) {
            Some(observation) => self.commit(observation),
            None => Ok(Vec::new()),
        }
    }

    /// End the session. Returns `Finished` the first time only.
    pub fn close(&mut self) -> Option<SessionEvent> {
        if self.finished {
            return None;
        }
        self.finished = true;
        self.accumulator.reset();
        info!("Scan session finished after {} saved record(s)", self.saved);
        Some(SessionEvent::Finished)
    }

    fn ensure_open(&self) -> std::result::Result<(), SessionError> {
        if self.finished {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn check_duplicate(&self, observation: &ScannedObservation) -> std::result::Result<(), SessionError> {
        match observation.tracking_number.as_deref() {
            Some(number) if self.store.contains_tracking(number) => Err(SessionError::Duplicate {
                tracking_number: number.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn commit(&mut self, observation: ScannedObservation) -> Result<Vec<SessionEvent>> {
        let mut events = Vec::new();

        if self.config.mode.is_return() {
            info!("Returning {:?} capture to caller", self.config.mode);
            events.push(SessionEvent::Returned { observation });
            events.extend(self.close());
            return Ok(events);
        }

        if let Err(SessionError::Duplicate { tracking_number }) = self.check_duplicate(&observation) {
            warn!("Duplicate tracking number {} rejected", tracking_number);
            events.push(SessionEvent::Duplicate { tracking_number });
            return Ok(events);
        }

        let record = FinalizedRecord::from_observation(observation);
        self.store.save(record.clone())?;
        self.saved += 1;
        info!(
            "Saved record {:?} ({})",
            record.tracking_number, record.confidence_status
        );
        events.push(SessionEvent::Saved { record });

        let ends = match self.config.mode {
            ScanMode::Single => true,
            ScanMode::Bulk => !self.config.continuous,
            _ => false,
        };
        if ends {
            events.extend(self.close());
        }

        Ok(events)
    }
}
