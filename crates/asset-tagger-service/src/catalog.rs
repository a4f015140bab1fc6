//! Catalog service
//!
//! Maintains the country and manufacturer lists offered for tag generation.
//! Removing an entry only affects future generation; assets already tagged
//! with the code are left untouched.

use asset_tagger_core::{CatalogEntry, Country, Manufacturer, TaggerError};
use asset_tagger_store::RecordStore;
use async_trait::async_trait;
use tracing::{info, instrument};

use crate::dto::{AddCatalogEntryRequest, Outcome};
use crate::error::{ServiceError, ServiceResult};
use crate::validation::parse_lookup_code;

/// Trait for catalog maintenance
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List countries
    async fn list_countries(&self) -> ServiceResult<Outcome<Vec<Country>>>;

    /// Add a country
    async fn add_country(&self, request: AddCatalogEntryRequest) -> ServiceResult<Outcome<Country>>;

    /// Remove a country by code
    async fn remove_country(&self, code: &str) -> ServiceResult<Outcome<Country>>;

    /// List manufacturers
    async fn list_manufacturers(&self) -> ServiceResult<Outcome<Vec<Manufacturer>>>;

    /// Add a manufacturer
    async fn add_manufacturer(&self, request: AddCatalogEntryRequest) -> ServiceResult<Outcome<Manufacturer>>;

    /// Remove a manufacturer by code
    async fn remove_manufacturer(&self, code: &str) -> ServiceResult<Outcome<Manufacturer>>;
}

/// Default implementation of CatalogService
pub struct DefaultCatalogService {
    store: RecordStore,
}

impl DefaultCatalogService {
    /// Create a new catalog service
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }
}

fn insert_entry<T: CatalogEntry + Clone>(
    entries: &mut Vec<T>,
    request: &AddCatalogEntryRequest,
) -> ServiceResult<T> {
    let entry = T::create(&request.code, &request.name)?;
    if entries.iter().any(|e| e.code() == entry.code()) {
        return Err(TaggerError::DuplicateCode {
            kind: T::KIND,
            code: entry.code().to_string(),
        }
        .into());
    }
    entries.push(entry.clone());
    Ok(entry)
}

fn take_entry<T: CatalogEntry>(entries: &mut Vec<T>, raw_code: &str) -> ServiceResult<T> {
    let code = parse_lookup_code(raw_code)?;
    let index = entries
        .iter()
        .position(|e| e.code() == &code)
        .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", T::KIND, code)))?;
    Ok(entries.remove(index))
}

#[async_trait]
impl CatalogService for DefaultCatalogService {
    async fn list_countries(&self) -> ServiceResult<Outcome<Vec<Country>>> {
        let mut session = self.store.open().await?;
        let countries = session.countries().to_vec();
        Ok(Outcome::new(countries, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn add_country(&self, request: AddCatalogEntryRequest) -> ServiceResult<Outcome<Country>> {
        let mut session = self.store.open().await?;
        let country = insert_entry(session.countries_mut(), &request)?;
        session.save_countries().await?;
        info!(code = %country.code, "Added country");
        Ok(Outcome::new(country, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn remove_country(&self, code: &str) -> ServiceResult<Outcome<Country>> {
        let mut session = self.store.open().await?;
        let country = take_entry(session.countries_mut(), code)?;
        session.save_countries().await?;
        info!(code = %country.code, "Removed country");
        Ok(Outcome::new(country, session.take_warnings()))
    }

    async fn list_manufacturers(&self) -> ServiceResult<Outcome<Vec<Manufacturer>>> {
        let mut session = self.store.open().await?;
        let manufacturers = session.manufacturers().to_vec();
        Ok(Outcome::new(manufacturers, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn add_manufacturer(&self, request: AddCatalogEntryRequest) -> ServiceResult<Outcome<Manufacturer>> {
        let mut session = self.store.open().await?;
        let manufacturer = insert_entry(session.manufacturers_mut(), &request)?;
        session.save_manufacturers().await?;
        info!(code = %manufacturer.code, "Added manufacturer");
        Ok(Outcome::new(manufacturer, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn remove_manufacturer(&self, code: &str) -> ServiceResult<Outcome<Manufacturer>> {
        let mut session = self.store.open().await?;
        let manufacturer = take_entry(session.manufacturers_mut(), code)?;
        session.save_manufacturers().await?;
        info!(code = %manufacturer.code, "Removed manufacturer");
        Ok(Outcome::new(manufacturer, session.take_warnings()))
    }
}
