//! Sequential tag generation
//!
//! The next tag for a (country, manufacturer) pair is
//! `1 + max(existing sequences with the same prefix)`, zero-padded to
//! [`SEQUENCE_WIDTH`](crate::types::SEQUENCE_WIDTH) digits. Existing tags
//! whose suffix is not a plain run of digits, or whose sequence is above
//! [`MAX_SEQUENCE`], are ignored.

use crate::error::{Result, TaggerError};
use crate::types::{AssetTag, Code, MAX_SEQUENCE};

/// Extract the sequence number of `tag` if it belongs to `prefix`
///
/// Returns `None` for tags with another prefix and for malformed suffixes
/// (empty, non-digit characters, or above [`MAX_SEQUENCE`]).
pub fn parse_sequence(tag: &str, prefix: &str) -> Option<u32> {
    let suffix = tag.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse::<u32>().ok().filter(|sequence| *sequence <= MAX_SEQUENCE)
}

/// Compute the next unused tag for a country and manufacturer
///
/// Both codes are validated first; an empty or malformed code is an error.
pub fn next_tag<I, S>(country_code: &str, manufacturer_code: &str, existing_tags: I) -> Result<AssetTag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let country = Code::parse(country_code)?;
    let manufacturer = Code::parse(manufacturer_code)?;
    next_tag_for_codes(&country, &manufacturer, existing_tags)
}

/// Compute the next unused tag for already validated codes
pub fn next_tag_for_codes<I, S>(country: &Code, manufacturer: &Code, existing_tags: I) -> Result<AssetTag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TagSequencer::new(country.clone(), manufacturer.clone(), existing_tags).next_tag()
}

/// Hands out consecutive tags for one prefix
///
/// Scans the existing tags once; each call to [`TagSequencer::next_tag`]
/// behaves like calling [`next_tag`] with every previously returned tag
/// added to the existing set.
#[derive(Debug, Clone)]
pub struct TagSequencer {
    country: Code,
    manufacturer: Code,
    last: u32,
}

impl TagSequencer {
    /// Create a sequencer positioned after the highest existing sequence
    pub fn new<I, S>(country: Code, manufacturer: Code, existing_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = AssetTag::prefix_for(&country, &manufacturer);
        let last = existing_tags
            .into_iter()
            .filter_map(|tag| parse_sequence(tag.as_ref(), &prefix))
            .max()
            .unwrap_or(0);

        Self {
            country,
            manufacturer,
            last,
        }
    }

    /// Highest sequence seen or handed out so far (0 when none)
    pub fn last_sequence(&self) -> u32 {
        self.last
    }

    /// The tag the next call to `next_tag` would return
    pub fn peek(&self) -> Result<AssetTag> {
        let next = self.following()?;
        Ok(AssetTag::new(self.country.clone(), self.manufacturer.clone(), next))
    }

    /// Return the next tag and advance
    pub fn next_tag(&mut self) -> Result<AssetTag> {
        let next = self.following()?;
        self.last = next;
        Ok(AssetTag::new(self.country.clone(), self.manufacturer.clone(), next))
    }

    fn following(&self) -> Result<u32> {
        match self.last.checked_add(1) {
            Some(next) if next <= MAX_SEQUENCE => Ok(next),
            _ => Err(TaggerError::SequenceOverflow(AssetTag::prefix_for(
                &self.country,
                &self.manufacturer,
            ))),
        }
    }
}
