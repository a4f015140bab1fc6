//! Data Transfer Objects (DTOs) for service layer
//!
//! This module defines request and response types used at service boundaries,
//! separating internal domain models from external interfaces.

use asset_tagger_core::{Asset, AssetTag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest batch a single generate request may produce
pub const MAX_GENERATE_COUNT: u32 = 100;

/// Default page size for asset listings
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Largest page size for asset listings
pub const MAX_LIST_LIMIT: usize = 500;

/// Default number of recent assets
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Operation result together with non-fatal storage warnings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome<T> {
    /// Operation result
    pub data: T,

    /// Warnings raised while loading or saving documents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> Outcome<T> {
    /// Wrap a result with warnings
    pub fn new(data: T, warnings: Vec<String>) -> Self {
        Self { data, warnings }
    }

    /// Split into result and warnings
    pub fn into_parts(self) -> (T, Vec<String>) {
        (self.data, self.warnings)
    }
}

// ============================================================================
// Tagging DTOs
// ============================================================================

/// Query for the next tag of a country/manufacturer pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextTagRequest {
    /// Country code
    pub country_code: String,

    /// Manufacturer code
    pub manufacturer_code: String,
}

/// The tag the next generation would assign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextTagResponse {
    /// Full tag
    pub tag: String,

    /// Country code
    pub country_code: String,

    /// Manufacturer code
    pub manufacturer_code: String,

    /// Sequence number
    pub sequence: u32,
}

impl From<&AssetTag> for NextTagResponse {
    fn from(tag: &AssetTag) -> Self {
        Self {
            tag: tag.to_string(),
            country_code: tag.country().to_string(),
            manufacturer_code: tag.manufacturer().to_string(),
            sequence: tag.sequence(),
        }
    }
}

/// Request to generate one or more sequential tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTagsRequest {
    /// Country code
    pub country_code: String,

    /// Manufacturer code
    pub manufacturer_code: String,

    /// Asset name; numbered `"{name} #{i}"` when more than one tag is generated
    pub name: String,

    /// Optional description applied to every generated asset
    #[serde(default)]
    pub description: Option<String>,

    /// Number of tags to generate
    #[serde(default = "default_count")]
    pub count: u32,

    /// Return the would-be assets without persisting them
    #[serde(default)]
    pub dry_run: bool,
}

fn default_count() -> u32 {
    1
}

/// Generated assets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTagsResponse {
    /// Assets in generation order
    pub assets: Vec<Asset>,

    /// Whether the assets were left unsaved
    pub dry_run: bool,
}

/// Manual entry of an asset with an explicit tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    /// Tag in `COUNTRY-MANUFACTURER-NNNNN` form
    pub tag: String,

    /// Asset name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Pasted list of existing tags, one per line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTagsRequest {
    /// Raw text
    pub text: String,
}

/// A line that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedLine {
    /// 1-based line number in the pasted text
    pub line: usize,

    /// Trimmed line content
    pub input: String,

    /// Why the line was rejected
    pub reason: String,
}

/// Import report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportTagsResponse {
    /// Newly created assets
    pub imported: Vec<Asset>,

    /// Tags already present, in the store or earlier in the paste
    pub skipped: Vec<String>,

    /// Lines that are not valid tags
    pub rejected: Vec<RejectedLine>,
}

// ============================================================================
// Inventory DTOs
// ============================================================================

/// Asset listing filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAssetsRequest {
    /// Only assets of this country
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Only assets of this manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_code: Option<String>,

    /// Case-insensitive match on tag, name or description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Maximum number of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Number of results to skip
    #[serde(default)]
    pub offset: usize,
}

/// One page of assets, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAssetsResponse {
    /// Matching assets
    pub assets: Vec<Asset>,

    /// Total number of matches (without pagination)
    pub total: usize,

    /// Current offset
    pub offset: usize,

    /// Current limit
    pub limit: usize,

    /// Whether there are more results
    pub has_more: bool,
}

/// Editable asset fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAssetRequest {
    /// New name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tags cannot change; a value different from the current tag is rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Quick inventory statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of assets
    pub total_assets: usize,

    /// Distinct country codes used by assets
    pub countries_in_use: usize,

    /// Distinct manufacturer codes used by assets
    pub manufacturers_in_use: usize,

    /// Countries in the catalog
    pub catalog_countries: usize,

    /// Manufacturers in the catalog
    pub catalog_manufacturers: usize,

    /// Asset count per `COUNTRY-MANUFACTURER` pair
    pub per_prefix: BTreeMap<String, usize>,

    /// Creation time of the newest asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_created: Option<DateTime<Utc>>,
}

// ============================================================================
// Catalog DTOs
// ============================================================================

/// New country or manufacturer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCatalogEntryRequest {
    /// Short code, 1 to 5 letters or digits
    pub code: String,

    /// Display name
    pub name: String,
}
