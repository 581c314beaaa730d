//! Registration code format.
//!
//! A registration code is the only credential a manager presents to claim
//! notification rights over a published application, so it is drawn from the
//! operating system's CSPRNG and kept short enough to type by hand.

use rand::{rngs::OsRng, Rng};
use thiserror::Error;

/// Constant prefix of every registration code.
pub const CODE_PREFIX: &str = "OFB";

/// Number of decimal digits after the prefix.
pub const CODE_DIGITS: usize = 8;

/// Total length of a code, `OFB-` plus the digits.
pub const CODE_LENGTH: usize = CODE_PREFIX.len() + 1 + CODE_DIGITS;

lazy_static::lazy_static! {
    /// Matches a normalized (uppercase, trimmed) registration code.
    pub static ref CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^OFB-\d{8}$").expect("registration code pattern is valid");
}

/// Error returned when text does not look like a registration code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid registration code format, expected OFB-00000000")]
pub struct CodeFormatError;

/// Generate a fresh registration code such as `OFB-04718265`.
pub fn generate_registration_code() -> String {
    let upper = 10u32.pow(CODE_DIGITS as u32);
    let value = OsRng.gen_range(0..upper);
    format!("{}-{:0width$}", CODE_PREFIX, value, width = CODE_DIGITS)
}

/// Normalize user input into the stored code form.
///
/// Surrounding whitespace is dropped and letters are uppercased, so
/// `" ofb-12345678 "` becomes `"OFB-12345678"`.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Normalize and validate user input as a registration code.
pub fn parse_registration_code(input: &str) -> Result<String, CodeFormatError> {
    let normalized = normalize_code(input);
    if is_registration_code(&normalized) {
        Ok(normalized)
    } else {
        Err(CodeFormatError)
    }
}

/// Whether an already-normalized string is a well-formed code.
pub fn is_registration_code(normalized: &str) -> bool {
    normalized.len() == CODE_LENGTH && CODE_REGEX.is_match(normalized)
}
