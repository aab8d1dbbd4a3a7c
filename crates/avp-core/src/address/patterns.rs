//! Regex patterns for postal address extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Postal code + city: "75001 PARIS", "F-75001 PARIS", "91000ÉVRY"
    pub static ref POSTAL_CITY: Regex = Regex::new(
        r"(?i)(?:^|[^0-9])(?:[A-Z]{1,2}-)?[0-9]{5}(?:\s+[\p{L}0-9]{2,}|\p{L}{2,})"
    ).unwrap();

    pub static ref COUNTRY_LINE: Regex = Regex::new(
        r"(?i)^\s*FRANCE\s*$"
    ).unwrap();

    // Recipient civility or company markers
    pub static ref CIVILITY: Regex = Regex::new(
        r"(?i)\b(?:MME|MLLE|MONSIEUR|MADAME|SOCI[EÉ]T[EÉ]|ETS|CHEZ)\b|\bMM?\."
    ).unwrap();

    // Sender, regulatory and carrier metadata markers
    pub static ref FORBIDDEN: Regex = Regex::new(
        r"(?i)\b(?:EXP[EÉ]DITEUR|RETOUR|SERVICE|CLIENT|CEDEX|TSA|CS)\b"
    ).unwrap();
}

/// Whether a line holds a postal code followed by a city.
pub fn is_postal_line(line: &str) -> bool {
    POSTAL_CITY.is_match(line.trim())
}

/// Whether a line is the country line.
pub fn is_country_line(line: &str) -> bool {
    COUNTRY_LINE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_line() {
        assert!(is_postal_line("75001 PARIS"));
        assert!(is_postal_line("F-75001 PARIS"));
        assert!(is_postal_line("  13008 Marseille "));
        assert!(is_postal_line("91000ÉVRY"));
        assert!(!is_postal_line("86912345678901U"));
        assert!(!is_postal_line("1275001 PARIS"));
        assert!(!is_postal_line("12 RUE DE PARIS"));
    }

    #[test]
    fn test_keywords() {
        assert!(CIVILITY.is_match("MME DUPONT"));
        assert!(CIVILITY.is_match("M. MARTIN"));
        assert!(CIVILITY.is_match("Société Générale"));
        assert!(!CIVILITY.is_match("ADAM. PIERRE"));
        assert!(FORBIDDEN.is_match("RETOUR EXPEDITEUR"));
        assert!(FORBIDDEN.is_match("CS 70001"));
        assert!(!FORBIDDEN.is_match("DOCS"));
        assert!(!FORBIDDEN.is_match("MME DUPONT"));
    }
}
