//! Request validation and lookup helpers shared by the services

use asset_tagger_core::{Asset, AssetTag, CatalogEntry, Code};

use crate::dto::{GenerateTagsRequest, MAX_GENERATE_COUNT, MAX_LIST_LIMIT};
use crate::error::{ServiceError, ServiceResult};

/// Check a generate request before touching the store
pub fn validate_generate(request: &GenerateTagsRequest) -> ServiceResult<()> {
    if request.count == 0 || request.count > MAX_GENERATE_COUNT {
        return Err(ServiceError::ValidationFailed(format!(
            "count must be between 1 and {}",
            MAX_GENERATE_COUNT
        )));
    }

    if request.name.trim().is_empty() {
        return Err(ServiceError::ValidationFailed(
            "Asset name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Clamp a requested page size to `1..=MAX_LIST_LIMIT`
pub fn normalize_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
}

/// Resolve a code that must be present in a catalog
pub fn require_catalog_code<T: CatalogEntry>(entries: &[T], raw: &str) -> ServiceResult<Code> {
    let code = Code::parse(raw)?;
    if entries.iter().any(|entry| entry.code() == &code) {
        Ok(code)
    } else {
        Err(ServiceError::ValidationFailed(format!(
            "Unknown {} code '{}'",
            T::KIND,
            code
        )))
    }
}

/// Parse a tag used to address an existing asset
pub fn parse_lookup_tag(raw: &str) -> ServiceResult<AssetTag> {
    AssetTag::parse(raw).map_err(|e| ServiceError::InvalidInput(e.to_string()))
}

/// Parse a code used to address an existing catalog entry or filter
pub fn parse_lookup_code(raw: &str) -> ServiceResult<Code> {
    Code::parse(raw).map_err(|e| ServiceError::InvalidInput(e.to_string()))
}

/// Index of the asset carrying `tag`, ignoring zero padding
pub fn find_asset(assets: &[Asset], tag: &AssetTag) -> Option<usize> {
    let canonical = tag.to_string();
    assets.iter().position(|asset| {
        asset.tag == canonical
            || asset
                .parsed_tag()
                .map(|existing| existing.key() == tag.key())
                .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_tagger_core::{Country, Manufacturer};

    fn request(count: u32, name: &str) -> GenerateTagsRequest {
        GenerateTagsRequest {
            country_code: "EGY".to_string(),
            manufacturer_code: "ZE".to_string(),
            name: name.to_string(),
            description: None,
            count,
            dry_run: false,
        }
    }

    #[test]
    fn test_validate_generate() {
        assert!(validate_generate(&request(1, "Printer")).is_ok());
        assert!(validate_generate(&request(100, "Printer")).is_ok());
        assert!(validate_generate(&request(0, "Printer")).is_err());
        assert!(validate_generate(&request(101, "Printer")).is_err());
        assert!(validate_generate(&request(1, "  ")).is_err());
    }

    #[test]
    fn test_normalize_limit() {
        assert_eq!(normalize_limit(None, 50), 50);
        assert_eq!(normalize_limit(Some(0), 50), 1);
        assert_eq!(normalize_limit(Some(10_000), 50), MAX_LIST_LIMIT);
    }

    #[test]
    fn test_require_catalog_code() {
        let countries = Country::defaults();
        assert_eq!(require_catalog_code(&countries, "egy").unwrap().as_str(), "EGY");

        let err = require_catalog_code(&Manufacturer::defaults(), "XX").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Unknown manufacturer code 'XX'");
        assert!(require_catalog_code(&countries, "").is_err());
    }

    #[test]
    fn test_find_asset_ignores_padding() {
        let assets = vec![
            Asset::new(&AssetTag::parse("EGY-ZE-0001").unwrap(), "Old label").unwrap(),
            Asset::new(&AssetTag::parse("EGY-ZE-00002").unwrap(), "New label").unwrap(),
        ];
        assert_eq!(find_asset(&assets, &AssetTag::parse("EGY-ZE-00001").unwrap()), Some(0));
        assert_eq!(find_asset(&assets, &AssetTag::parse("egy-ze-2").unwrap()), Some(1));
        assert_eq!(find_asset(&assets, &AssetTag::parse("EGY-HP-00001").unwrap()), None);
    }
}
