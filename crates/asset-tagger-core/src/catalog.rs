//! Country and manufacturer catalog entries

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TaggerError};
use crate::types::Code;

/// Common behavior of catalog entries
pub trait CatalogEntry {
    /// Human label used in messages ("country", "manufacturer")
    const KIND: &'static str;

    /// Build and validate an entry
    fn create(code: &str, name: &str) -> Result<Self>
    where
        Self: Sized;

    /// Unique code of the entry
    fn code(&self) -> &Code;

    /// Display name of the entry
    fn name(&self) -> &str;

    /// Entries offered when the catalog is seeded
    fn defaults() -> Vec<Self>
    where
        Self: Sized;
}

/// Countries offered when the catalog is seeded
pub const DEFAULT_COUNTRIES: &[(&str, &str)] = &[("EGY", "Egypt"), ("KSA", "Saudi Arabia")];

/// Manufacturers offered when the catalog is seeded
pub const DEFAULT_MANUFACTURERS: &[(&str, &str)] = &[
    ("ZE", "Zebra Electronics"),
    ("HP", "Hewlett Packard"),
    ("DE", "Dell"),
    ("LE", "Lenovo"),
    ("AP", "Apple"),
];

fn validate_name(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaggerError::ValidationError(format!(
            "{} name cannot be empty",
            kind
        )));
    }
    Ok(name.to_string())
}

/// A country assets can be registered in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Unique short code, e.g. `EGY`
    pub code: Code,
    /// Display name
    pub name: String,
}

impl CatalogEntry for Country {
    const KIND: &'static str = "country";

    fn create(code: &str, name: &str) -> Result<Self> {
        Ok(Self {
            code: Code::parse(code)?,
            name: validate_name(Self::KIND, name)?,
        })
    }

    fn code(&self) -> &Code {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn defaults() -> Vec<Self> {
        seeds(DEFAULT_COUNTRIES)
    }
}

/// A manufacturer assets can be attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    /// Unique short code, e.g. `ZE`
    pub code: Code,
    /// Display name
    pub name: String,
}

impl CatalogEntry for Manufacturer {
    const KIND: &'static str = "manufacturer";

    fn create(code: &str, name: &str) -> Result<Self> {
        Ok(Self {
            code: Code::parse(code)?,
            name: validate_name(Self::KIND, name)?,
        })
    }

    fn code(&self) -> &Code {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn defaults() -> Vec<Self> {
        seeds(DEFAULT_MANUFACTURERS)
    }
}

fn seeds<T: CatalogEntry>(entries: &[(&str, &str)]) -> Vec<T> {
    entries
        .iter()
        .filter_map(|(code, name)| T::create(code, name).ok())
        .collect()
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_normalizes_code_and_name() {
        let country = Country::create(" egy ", "  Egypt ").unwrap();
        assert_eq!(country.code.as_str(), "EGY");
        assert_eq!(country.name, "Egypt");
        assert_eq!(country.to_string(), "EGY - Egypt");
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let err = Manufacturer::create("ZE", "   ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: manufacturer name cannot be empty"
        );
    }

    #[test]
    fn test_every_default_is_valid() {
        assert_eq!(Country::defaults().len(), DEFAULT_COUNTRIES.len());
        assert_eq!(Manufacturer::defaults().len(), DEFAULT_MANUFACTURERS.len());
    }

    #[test]
    fn test_defaults_are_unique() {
        let manufacturers = Manufacturer::defaults();
        let mut codes: Vec<&str> = manufacturers.iter().map(|m| m.code.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), manufacturers.len());
        assert_eq!(Country::defaults().len(), 2);
    }
}
