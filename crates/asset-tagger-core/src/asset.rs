//! Asset records
//!
//! An asset is keyed by its tag. The tag is assigned once, when the asset is
//! created, and never changes afterwards; the country and manufacturer codes
//! stored alongside it always agree with the tag.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{Result, TaggerError};
use crate::types::{AssetTag, Code};

/// Maximum length of an asset name
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of an asset description
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// A physical asset identified by its tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique tag, immutable once created
    pub tag: String,

    /// Country code the tag was issued for
    pub country_code: Code,

    /// Manufacturer code the tag was issued for
    pub manufacturer_code: Code,

    /// Human-readable name
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Creation timestamp
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date_created: DateTime<Utc>,
}

impl Asset {
    /// Create a new asset for a tag, stamped with the current time
    pub fn new(tag: &AssetTag, name: impl Into<String>) -> Result<Self> {
        Self::builder(tag.clone(), name).build()
    }

    /// Create a builder for constructing assets
    pub fn builder(tag: AssetTag, name: impl Into<String>) -> AssetBuilder {
        AssetBuilder::new(tag, name)
    }

    /// Parse the stored tag
    pub fn parsed_tag(&self) -> Result<AssetTag> {
        AssetTag::parse(&self.tag)
    }

    /// Validate the asset
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)?;

        let parsed = self.parsed_tag()?;
        if parsed.to_string() != self.tag {
            return Err(TaggerError::InvalidTag(self.tag.clone()));
        }
        if parsed.country() != &self.country_code || parsed.manufacturer() != &self.manufacturer_code {
            return Err(TaggerError::ValidationError(format!(
                "Tag {} does not match codes {}/{}",
                self.tag, self.country_code, self.manufacturer_code
            )));
        }

        Ok(())
    }

    /// Rename the asset
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into().trim().to_string();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Replace the description
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        let description = description.into().trim().to_string();
        validate_description(&description)?;
        self.description = description;
        Ok(())
    }

    /// `COUNTRY-MANUFACTURER` pair of the asset
    pub fn prefix(&self) -> String {
        format!("{}-{}", self.country_code, self.manufacturer_code)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({}, {})", self.tag, self.name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TaggerError::ValidationError(
            "Asset name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(TaggerError::ValidationError(format!(
            "Asset name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(TaggerError::ValidationError(format!(
            "Asset description cannot exceed {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

/// Accepts RFC 3339 and offset-less ISO-8601 timestamps (read as UTC)
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Parse a stored timestamp
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| TaggerError::SerializationError(format!("Invalid timestamp '{}': {}", raw, e)))
}

/// Builder for constructing Asset instances
pub struct AssetBuilder {
    tag: AssetTag,
    name: String,
    description: String,
    date_created: DateTime<Utc>,
}

impl AssetBuilder {
    /// Create a new asset builder
    pub fn new(tag: AssetTag, name: impl Into<String>) -> Self {
        Self {
            tag,
            name: name.into(),
            description: String::new(),
            date_created: Utc::now(),
        }
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the creation timestamp
    pub fn date_created(mut self, timestamp: DateTime<Utc>) -> Self {
        self.date_created = timestamp;
        self
    }

    /// Build the asset with validation
    pub fn build(self) -> Result<Asset> {
        let asset = Asset {
            tag: self.tag.to_string(),
            country_code: self.tag.country().clone(),
            manufacturer_code: self.tag.manufacturer().clone(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            date_created: self.date_created,
        };
        asset.validate()?;
        Ok(asset)
    }
}
