//! Plate text normalization and format validation.
//!
//! OCR output is noisy: spaces, dashes and stray symbols around the
//! registration. Text is uppercased, reduced to `[A-Z0-9]`, and the leftmost
//! substring matching the regulatory grammar is taken as the plate.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// 2 letters, 1-2 digits, 1-2 letters, 3-4 digits.
const PLATE_GRAMMAR: &str = r"[A-Z]{2}[0-9]{1,2}[A-Z]{1,2}[0-9]{3,4}";

// Constant pattern: compiling it cannot fail once it has compiled in a test.
static PLATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLATE_GRAMMAR).expect("plate grammar is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlateError {
    #[error("text {0:?} does not contain a valid plate")]
    InvalidFormat(String),
}

/// A validated vehicle registration. Only [`Plate::parse`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Plate(String);

impl Plate {
    pub fn parse(raw: &str) -> Result<Self, PlateError> {
        let normalized = normalize(raw);
        PLATE_PATTERN
            .find(&normalized)
            .map(|m| Plate(m.as_str().to_string()))
            .ok_or_else(|| PlateError::InvalidFormat(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uppercase and drop everything outside `[A-Z0-9]`.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
