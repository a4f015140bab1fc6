//! Core type definitions

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TaggerError};

/// Minimum number of digits in a generated sequence
pub const SEQUENCE_WIDTH: usize = 5;

/// Highest sequence number a tag may carry
pub const MAX_SEQUENCE: u32 = 99_999_999;

/// Maximum length of a country or manufacturer code
pub const MAX_CODE_LEN: usize = 5;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z0-9]{1,5})-([A-Z0-9]{1,5})-([0-9]+)$").expect("tag pattern is valid")
});

/// Country or manufacturer code
///
/// Input is trimmed and upper-cased; the result must be 1 to 5 ASCII
/// alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Parse and normalize a code
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(TaggerError::invalid_code(raw, "code cannot be empty"));
        }

        if normalized.len() > MAX_CODE_LEN {
            return Err(TaggerError::invalid_code(
                raw,
                format!("code cannot exceed {} characters", MAX_CODE_LEN),
            ));
        }

        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TaggerError::invalid_code(
                raw,
                "code must contain only letters and digits",
            ));
        }

        Ok(Self(normalized))
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Code {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self> {
        Code::parse(s)
    }
}

impl TryFrom<String> for Code {
    type Error = TaggerError;

    fn try_from(value: String) -> Result<Self> {
        Code::parse(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parsed view of an asset tag `COUNTRY-MANUFACTURER-NNNNN`
///
/// `width` is the number of sequence digits the tag is written with. Tags
/// produced by the generator always use [`SEQUENCE_WIDTH`]; parsed tags keep
/// the digit count they were written with so that labels already printed
/// round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetTag {
    country: Code,
    manufacturer: Code,
    sequence: u32,
    width: usize,
}

impl AssetTag {
    /// Create a canonical tag with the default sequence width
    pub fn new(country: Code, manufacturer: Code, sequence: u32) -> Self {
        Self {
            country,
            manufacturer,
            sequence,
            width: SEQUENCE_WIDTH,
        }
    }

    /// Parse a tag string
    ///
    /// Surrounding whitespace is ignored and letters are upper-cased before
    /// matching.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        let caps = TAG_PATTERN
            .captures(&normalized)
            .ok_or_else(|| TaggerError::InvalidTag(raw.trim().to_string()))?;

        let digits = &caps[3];
        let sequence = digits
            .parse::<u32>()
            .ok()
            .filter(|sequence| *sequence <= MAX_SEQUENCE)
            .ok_or_else(|| TaggerError::InvalidTag(raw.trim().to_string()))?;

        Ok(Self {
            country: Code::parse(&caps[1])?,
            manufacturer: Code::parse(&caps[2])?,
            sequence,
            width: digits.len(),
        })
    }

    /// Prefix shared by every tag of the same country and manufacturer
    pub fn prefix_for(country: &Code, manufacturer: &Code) -> String {
        format!("{}-{}-", country, manufacturer)
    }

    /// Country code
    pub fn country(&self) -> &Code {
        &self.country
    }

    /// Manufacturer code
    pub fn manufacturer(&self) -> &Code {
        &self.manufacturer
    }

    /// Sequence number
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Sequence digits exactly as written in the tag
    pub fn sequence_digits(&self) -> String {
        format!("{:0width$}", self.sequence, width = self.width)
    }

    /// Identity of the tag regardless of zero padding
    ///
    /// `EGY-ZE-0001` and `EGY-ZE-00001` label the same asset.
    pub fn key(&self) -> (&Code, &Code, u32) {
        (&self.country, &self.manufacturer, self.sequence)
    }
}

impl fmt::Display for AssetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:0width$}",
            self.country,
            self.manufacturer,
            self.sequence,
            width = self.width
        )
    }
}

impl FromStr for AssetTag {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self> {
        AssetTag::parse(s)
    }
}
