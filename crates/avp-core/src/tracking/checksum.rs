//! Check-character schemes for 14-character tracking payloads.
//!
//! Both functions expect exactly 14 characters. They only validate the
//! character set; checking the length is the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::ChecksumError;

const ISO_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ISO_MODULUS: u32 = 36;

/// Which check-character scheme a payload uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckScheme {
    /// ISO/IEC 7064 MOD 37-36, alphanumeric key.
    Iso7064,
    /// Weighted mod-10 (weights 3/1 from the right), numeric key.
    LaPoste,
}

impl CheckScheme {
    /// SmartData range 869 uses ISO 7064; every other range uses the La Poste key.
    pub fn for_payload(payload: &str) -> Self {
        if payload.starts_with("869") {
            CheckScheme::Iso7064
        } else {
            CheckScheme::LaPoste
        }
    }

    /// Compute the check character for a payload.
    pub fn key(&self, payload: &str) -> Result<char, ChecksumError> {
        match self {
            CheckScheme::Iso7064 => iso_key(payload),
            CheckScheme::LaPoste => la_poste_key(payload),
        }
    }
}

/// ISO/IEC 7064 MOD 37-36 check character.
///
/// Hybrid system: P starts at 36; for each character P = ((P + v) folded into
/// 1..=36) * 2 mod 37; the key is alphabet[(37 - P) mod 36].
pub fn iso_key(payload: &str) -> Result<char, ChecksumError> {
    let mut p = ISO_MODULUS;

    for c in payload.chars() {
        let v = iso_value(c)?;
        p += v;
        if p > ISO_MODULUS {
            p -= ISO_MODULUS;
        }
        p = (p * 2) % (ISO_MODULUS + 1);
    }

    let index = ((ISO_MODULUS + 1 - p) % ISO_MODULUS) as usize;
    Ok(ISO_ALPHABET[index] as char)
}

fn iso_value(c: char) -> Result<u32, ChecksumError> {
    ISO_ALPHABET
        .iter()
        .position(|&a| a as char == c)
        .map(|i| i as u32)
        .ok_or(ChecksumError::InvalidCharacter(c))
}

/// La Poste weighted mod-10 check digit.
///
/// Positions counted from the right starting at 1: odd positions weigh 3,
/// even positions weigh 1.
pub fn la_poste_key(payload: &str) -> Result<char, ChecksumError> {
    let mut sum = 0u32;

    for (i, c) in payload.chars().rev().enumerate() {
        let digit = c.to_digit(10).ok_or(ChecksumError::InvalidDigit(c))?;
        let weight = if (i + 1) % 2 == 1 { 3 } else { 1 };
        sum += digit * weight;
    }

    let remainder = sum % 10;
    let key = if remainder == 0 { 0 } else { 10 - remainder };
    Ok(char::from_digit(key, 10).unwrap_or('0'))
}

/// Compute the key for a SmartData payload with the scheme its range selects.
pub fn smartdata_key(payload: &str) -> Result<char, ChecksumError> {
    CheckScheme::for_payload(payload).key(payload)
}

/// Check a complete 15-character number against the scheme its range selects.
pub fn validate_tracking_number(number: &str) -> bool {
    let chars: Vec<char> = number.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() != 15 {
        return false;
    }

    let payload: String = chars[..14].iter().collect();
    smartdata_key(&payload)
        .map(|key| key == chars[14])
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_key_vectors() {
        assert_eq!(iso_key("86912345678901"), Ok('U'));
        assert_eq!(iso_key("86900000000001"), Ok('Q'));
        assert_eq!(iso_key("00000000000000"), Ok('U'));
        assert_eq!(iso_key("12345678901234"), Ok('E'));
    }

    #[test]
    fn test_iso_key_accepts_letters() {
        assert_eq!(iso_key("RR123456789FR"), Ok('C'));
    }

    #[test]
    fn test_iso_key_rejects_lowercase_and_symbols() {
        assert_eq!(
            iso_key("8691234567890a"),
            Err(ChecksumError::InvalidCharacter('a'))
        );
        assert_eq!(
            iso_key("869-1234567890"),
            Err(ChecksumError::InvalidCharacter('-'))
        );
    }

    #[test]
    fn test_la_poste_key_vectors() {
        assert_eq!(la_poste_key("86512345678901"), Ok('1'));
        assert_eq!(la_poste_key("86500000000000"), Ok('9'));
        assert_eq!(la_poste_key("86912345678901"), Ok('7'));
        assert_eq!(la_poste_key("00000000000000"), Ok('0'));
    }

    #[test]
    fn test_la_poste_key_rejects_letters() {
        assert_eq!(
            la_poste_key("8651234567890X"),
            Err(ChecksumError::InvalidDigit('X'))
        );
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(iso_key("86912345678901"), Ok('U'));
            assert_eq!(la_poste_key("86512345678901"), Ok('1'));
        }
    }

    #[test]
    fn test_scheme_selection() {
        assert_eq!(CheckScheme::for_payload("86912345678901"), CheckScheme::Iso7064);
        assert_eq!(CheckScheme::for_payload("86512345678901"), CheckScheme::LaPoste);
        assert_eq!(smartdata_key("86912345678901"), Ok('U'));
        assert_eq!(smartdata_key("86512345678901"), Ok('1'));
    }

    #[test]
    fn test_validate_tracking_number() {
        assert!(validate_tracking_number("86912345678901U"));
        assert!(validate_tracking_number("865 1234 5678 901 1"));
        assert!(!validate_tracking_number("86912345678901X"));
        assert!(!validate_tracking_number("8691234567890"));
    }
}
