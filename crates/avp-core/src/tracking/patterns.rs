//! Regex patterns for tracking number extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // SmartData DataMatrix: "%" + 7-digit header + 14-digit payload
    pub static ref SMARTDATA_HEADER: Regex = Regex::new(
        r"^%[0-9]{7}([0-9]{14})"
    ).unwrap();

    // Industrial payload ranges 865 / 869 anywhere in the content
    pub static ref SMARTDATA_PAYLOAD: Regex = Regex::new(
        r"86[59][0-9]{11}"
    ).unwrap();

    // UPU S10: RR123456789FR
    pub static ref UPU_S10: Regex = Regex::new(
        r"^[A-Z]{2}[0-9]{9}[A-Z]{2}$"
    ).unwrap();

    // Colissimo / internal / industrial numbers
    pub static ref GENERAL_TRACKING: Regex = Regex::new(
        r"^[A-Z0-9]{11,15}$"
    ).unwrap();

    // Printed label: "SD : 869 123 456 789 01 X"
    pub static ref SD_LABEL: Regex = Regex::new(
        r"(?i)\bSD[ \t]*:?[ \t]*([0-9A-Z ]{14,25})"
    ).unwrap();
}
