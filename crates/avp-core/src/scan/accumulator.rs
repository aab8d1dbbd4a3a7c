//! Per-session accumulation of frame observations.

use tracing::{debug, trace};

use super::merge::{is_complete, merge};
use crate::models::config::ScanMode;
use crate::models::scan::ScannedObservation;

/// Outcome of merging a frame without finalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offer {
    /// Pending state satisfies the completeness rule.
    pub complete: bool,
    /// The merge increased the address line count.
    pub address_grew: bool,
}

/// Fuses successive frame observations into one record.
///
/// Owned by a single session; frames must be fed in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FrameAccumulator {
    mode: ScanMode,
    pending: Option<ScannedObservation>,
}

impl FrameAccumulator {
    pub fn new(mode: ScanMode) -> Self {
        Self { mode, pending: None }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Switch the completeness rule. Starts a new session: pending is dropped.
    pub fn set_mode(&mut self, mode: ScanMode) {
        self.mode = mode;
        self.reset();
    }

    /// Best merged observation so far.
    pub fn pending(&self) -> Option<&ScannedObservation> {
        self.pending.as_ref()
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Merge a frame and finalize when appropriate.
    ///
    /// A manual trigger finalizes whatever has been gathered. Otherwise the
    /// merged state is finalized only once it is complete; incomplete data is
    /// kept for the next frame.
    pub fn ingest(
        &mut self,
        observation: ScannedObservation,
        manual: bool,
    ) -> Option<ScannedObservation> {
        if manual {
            let merged = merge(self.pending.as_ref(), observation);
            self.pending = None;
            debug!("Manual trigger, finalizing pending observation");
            return Some(merged);
        }

        let offer = self.offer(observation);
        if offer.complete {
            return self.finalize();
        }
        None
    }

    /// Merge a frame into pending state and report completeness.
    pub fn offer(&mut self, observation: ScannedObservation) -> Offer {
        let before = self
            .pending
            .as_ref()
            .map_or(0, ScannedObservation::address_line_count);

        let merged = merge(self.pending.as_ref(), observation);
        let complete = is_complete(&merged, self.mode);
        let address_grew = merged.address_line_count() > before;

        trace!(
            "Merged frame: tracking={:?} address_lines={} status={} complete={}",
            merged.tracking_number,
            merged.address_line_count(),
            merged.confidence_status,
            complete
        );

        self.pending = Some(merged);
        Offer { complete, address_grew }
    }

    /// Take the pending observation regardless of completeness.
    pub fn finalize(&mut self) -> Option<ScannedObservation> {
        self.pending.take()
    }

    /// Take the pending observation only if it is still complete.
    pub fn finalize_if_complete(&mut self) -> Option<ScannedObservation> {
        let complete = self
            .pending
            .as_ref()
            .is_some_and(|p| is_complete(p, self.mode));
        if complete { self.pending.take() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::{TrackingType, ValidationStatus};
    use pretty_assertions::assert_eq;

    fn tracking(number: &str) -> ScannedObservation {
        ScannedObservation {
            tracking_number: Some(number.to_string()),
            tracking_type: Some(TrackingType::Barcode1D),
            ..Default::default()
        }
    }

    fn address(text: &str) -> ScannedObservation {
        ScannedObservation {
            raw_address_text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_accumulates_until_complete() {
        let mut acc = FrameAccumulator::new(ScanMode::Bulk);

        assert_eq!(acc.ingest(tracking("RR123456789FR"), false), None);
        assert!(acc.pending().is_some());

        let record = acc.ingest(address("M. MARTIN\n69002 LYON"), false).unwrap();
        assert_eq!(record.tracking_number.as_deref(), Some("RR123456789FR"));
        assert_eq!(record.raw_address_text.as_deref(), Some("M. MARTIN\n69002 LYON"));
        assert!(acc.pending().is_none());
    }

    #[test]
    fn test_incomplete_never_finalized_automatically() {
        let mut acc = FrameAccumulator::new(ScanMode::Bulk);
        for _ in 0..50 {
            assert_eq!(acc.ingest(tracking("RR123456789FR"), false), None);
        }
        assert!(acc.pending().is_some());
    }

    #[test]
    fn test_manual_trigger_finalizes_incomplete() {
        let mut acc = FrameAccumulator::new(ScanMode::Bulk);
        acc.ingest(address("MME DUPONT\n75001 PARIS"), false);

        let record = acc.ingest(ScannedObservation::default(), true).unwrap();
        assert_eq!(record.raw_address_text.as_deref(), Some("MME DUPONT\n75001 PARIS"));
        assert_eq!(record.tracking_number, None);
        assert_eq!(record.confidence_status, ValidationStatus::Calculated);
        assert!(acc.pending().is_none());
    }

    #[test]
    fn test_offer_reports_address_growth() {
        let mut acc = FrameAccumulator::new(ScanMode::ReturnAddress);

        let offer = acc.offer(address("75001 PARIS"));
        assert_eq!(offer, Offer { complete: true, address_grew: true });

        let offer = acc.offer(address("75002 PARIS"));
        assert_eq!(offer, Offer { complete: true, address_grew: false });

        let offer = acc.offer(address("MME DUPONT\n75001 PARIS"));
        assert!(offer.address_grew);
    }

    #[test]
    fn test_first_frame_judged_like_later_frames() {
        use crate::ocr::{Frame, FrameInterpreter, RecognizedText};

        let text = RecognizedText::flat(
            "SD : 86512345678901 1\nMME DUPONT\n12 RUE DE PARIS\n75001 PARIS".to_string(),
        );
        let obs = FrameInterpreter::new()
            .interpret(&Frame::default(), &[], &text)
            .unwrap()
            .observation;

        let mut fresh = FrameAccumulator::new(ScanMode::Bulk);
        let first = fresh.ingest(obs.clone(), false);

        let mut warmed = FrameAccumulator::new(ScanMode::Bulk);
        assert_eq!(warmed.ingest(ScannedObservation::default(), false), None);
        let second = warmed.ingest(obs, false);

        assert_eq!(first.is_some(), second.is_some());
        assert_eq!(
            fresh.pending().map(|p| p.confidence_status),
            Some(ValidationStatus::Warning)
        );
    }

    #[test]
    fn test_mode_change_resets() {
        let mut acc = FrameAccumulator::new(ScanMode::Bulk);
        acc.offer(tracking("RR123456789FR"));
        acc.set_mode(ScanMode::ReturnTracking);
        assert!(acc.pending().is_none());
        assert_eq!(acc.finalize_if_complete(), None);

        acc.offer(tracking("RR123456789FR"));
        assert!(acc.finalize_if_complete().is_some());
    }
}
