//! Pure merge and completeness rules over observations.

use crate::models::config::ScanMode;
use crate::models::scan::{ScannedObservation, ValidationStatus};

/// Merge a new frame observation into the pending one.
///
/// A verified tracking number from the new frame replaces the old one;
/// otherwise the old one is kept. Keys and type prefer the new frame, the
/// address keeps whichever side is richer, and the status is recomputed
/// from the merged keys.
pub fn merge(old: Option<&ScannedObservation>, new: ScannedObservation) -> ScannedObservation {
    let Some(old) = old else {
        return ScannedObservation {
            confidence_status: ValidationStatus::from_keys(new.iso_key, new.ocr_key),
            ..new
        };
    };

    let new_richer = richer_address(&new, old);

    let tracking_number =
        if new.confidence_status == ValidationStatus::Verified && new.tracking_number.is_some() {
            new.tracking_number
        } else {
            old.tracking_number.clone().or(new.tracking_number)
        };

    let raw_address_text = if new_richer {
        new.raw_address_text
    } else {
        old.raw_address_text.clone()
    };

    let iso_key = new.iso_key.or(old.iso_key);
    let ocr_key = new.ocr_key.or(old.ocr_key);

    ScannedObservation {
        tracking_number,
        tracking_type: new.tracking_type.or(old.tracking_type),
        raw_address_text,
        iso_key,
        ocr_key,
        confidence_status: ValidationStatus::from_keys(iso_key, ocr_key),
        image_path: new.image_path.or_else(|| old.image_path.clone()),
    }
}

/// Whether `candidate`'s address is strictly richer than `current`'s.
///
/// More lines wins, then the longer text.
fn richer_address(candidate: &ScannedObservation, current: &ScannedObservation) -> bool {
    if !candidate.has_address() {
        return false;
    }
    if !current.has_address() {
        return true;
    }

    let by_lines = candidate
        .address_line_count()
        .cmp(&current.address_line_count());
    let by_len = || {
        let a = candidate.raw_address_text.as_deref().map_or(0, str::len);
        let b = current.raw_address_text.as_deref().map_or(0, str::len);
        a.cmp(&b)
    };

    by_lines.then_with(by_len).is_gt()
}

/// Whether an observation satisfies the completeness rule of a mode.
///
/// Full-capture modes need both fields; a SmartData tracking number must
/// also have an OCR-confirmed check character.
pub fn is_complete(observation: &ScannedObservation, mode: ScanMode) -> bool {
    match mode {
        ScanMode::ReturnTracking => observation.has_tracking(),
        ScanMode::ReturnAddress => observation.has_address(),
        ScanMode::Single | ScanMode::Bulk | ScanMode::ReturnAll => {
            if !observation.has_tracking() || !observation.has_address() {
                return false;
            }
            if observation.is_smartdata() {
                return observation.ocr_key.is_some()
                    && observation.confidence_status == ValidationStatus::Verified;
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::TrackingType;
    use pretty_assertions::assert_eq;

    fn address(text: &str) -> ScannedObservation {
        ScannedObservation {
            raw_address_text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn smartdata(number: &str, iso: char, ocr: Option<char>) -> ScannedObservation {
        ScannedObservation {
            tracking_number: Some(number.to_string()),
            tracking_type: Some(TrackingType::SmartdataDatamatrix),
            iso_key: Some(iso),
            ocr_key: ocr,
            confidence_status: ValidationStatus::from_keys(Some(iso), ocr),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_into_nothing_is_identity() {
        let obs = smartdata("86912345678901U", 'U', None);
        assert_eq!(merge(None, obs.clone()), obs);
    }

    #[test]
    fn test_merge_into_nothing_recomputes_status() {
        // label read alone: key '1' is La Poste, cross-reference iso key is 'S'
        let mut obs = smartdata("865123456789011", 'S', Some('1'));
        obs.confidence_status = ValidationStatus::Verified;
        obs.raw_address_text = Some("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS".to_string());

        let first = merge(None, obs.clone());
        assert_eq!(first.confidence_status, ValidationStatus::Warning);

        let after_empty = merge(Some(&merge(None, ScannedObservation::default())), obs);
        assert_eq!(first.confidence_status, after_empty.confidence_status);
        assert_eq!(
            is_complete(&first, ScanMode::Bulk),
            is_complete(&after_empty, ScanMode::Bulk)
        );
    }

    #[test]
    fn test_verified_tracking_replaces_old() {
        let old = smartdata("86912345678901X", 'U', Some('X'));
        let new = smartdata("86912345678901U", 'U', Some('U'));

        let merged = merge(Some(&old), new);
        assert_eq!(merged.tracking_number.as_deref(), Some("86912345678901U"));
        assert_eq!(merged.confidence_status, ValidationStatus::Verified);
    }

    #[test]
    fn test_unverified_tracking_keeps_old() {
        let old = smartdata("86912345678901U", 'U', Some('U'));
        let new = smartdata("86912345678999Q", 'Q', None);

        let merged = merge(Some(&old), new);
        assert_eq!(merged.tracking_number.as_deref(), Some("86912345678901U"));
        // keys prefer the new frame
        assert_eq!(merged.iso_key, Some('Q'));
        assert_eq!(merged.ocr_key, Some('U'));
        assert_eq!(merged.confidence_status, ValidationStatus::Warning);
    }

    #[test]
    fn test_tracking_from_new_when_old_has_none() {
        let old = address("MME DUPONT\n75001 PARIS");
        let new = smartdata("86912345678901U", 'U', None);

        let merged = merge(Some(&old), new);
        assert_eq!(merged.tracking_number.as_deref(), Some("86912345678901U"));
        assert_eq!(merged.raw_address_text.as_deref(), Some("MME DUPONT\n75001 PARIS"));
        assert_eq!(merged.confidence_status, ValidationStatus::Calculated);
    }

    #[test]
    fn test_richer_address_wins() {
        let two = address("MME DUPONT\n75001 PARIS");
        let three = address("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS");
        let longer_two = address("MADAME DUPONT\n75001 PARIS");

        let merged = merge(Some(&two), three.clone());
        assert_eq!(merged.raw_address_text, three.raw_address_text);

        let merged = merge(Some(&three), two.clone());
        assert_eq!(merged.raw_address_text, three.raw_address_text);

        let merged = merge(Some(&two), longer_two.clone());
        assert_eq!(merged.raw_address_text, longer_two.raw_address_text);

        let merged = merge(Some(&two), ScannedObservation::default());
        assert_eq!(merged.raw_address_text, two.raw_address_text);
    }

    #[test]
    fn test_address_merge_order_independent() {
        let a = address("75001 PARIS");
        let b = address("MME DUPONT\n75001 PARIS");
        let c = address("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS");

        let ab_c = merge(Some(&merge(Some(&a), b.clone())), c.clone());
        let ac_b = merge(Some(&merge(Some(&a), c.clone())), b.clone());
        assert_eq!(ab_c.raw_address_text, ac_b.raw_address_text);
    }

    #[test]
    fn test_smartdata_needs_confirmed_key() {
        let mut obs = smartdata("86912345678901U", 'U', None);
        obs.raw_address_text = Some("MME DUPONT\n75001 PARIS".to_string());
        assert!(!is_complete(&obs, ScanMode::Bulk));

        obs.ocr_key = Some('X');
        obs.confidence_status = ValidationStatus::Warning;
        assert!(!is_complete(&obs, ScanMode::Bulk));

        obs.ocr_key = Some('U');
        obs.confidence_status = ValidationStatus::Verified;
        assert!(is_complete(&obs, ScanMode::Bulk));
    }

    #[test]
    fn test_linear_barcode_complete_without_key() {
        let obs = ScannedObservation {
            tracking_number: Some("RR123456789FR".to_string()),
            tracking_type: Some(TrackingType::Barcode1D),
            raw_address_text: Some("M. MARTIN\n69002 LYON".to_string()),
            ..Default::default()
        };
        assert!(is_complete(&obs, ScanMode::Single));
        assert!(is_complete(&obs, ScanMode::ReturnAll));
    }

    #[test]
    fn test_partial_modes() {
        let tracking = smartdata("86912345678901U", 'U', None);
        let addr = address("75001 PARIS");

        assert!(is_complete(&tracking, ScanMode::ReturnTracking));
        assert!(!is_complete(&tracking, ScanMode::ReturnAddress));
        assert!(is_complete(&addr, ScanMode::ReturnAddress));
        assert!(!is_complete(&addr, ScanMode::ReturnTracking));
        assert!(!is_complete(&addr, ScanMode::Bulk));
    }
}
