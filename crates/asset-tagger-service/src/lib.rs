//! Service layer for the asset tagger
//!
//! This crate provides the service layer that sits between the API and storage layers.
//! Every operation opens a store session, applies its change to the loaded
//! collections and saves the affected document before the session is released.
//!
//! # Architecture
//!
//! - **TaggingService**: next-tag preview, batch generation, manual entry and import
//! - **InventoryService**: lookup, listing, statistics, edits and QR rendering
//! - **CatalogService**: country and manufacturer maintenance
//!
//! # Example
//!
//! ```rust,no_run
//! use asset_tagger_service::{GenerateTagsRequest, ServiceRegistry};
//! use asset_tagger_store::{LocalFileBackend, RecordStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RecordStore::new(Arc::new(LocalFileBackend::new("data")));
//! let services = ServiceRegistry::new(store);
//!
//! let outcome = services
//!     .tagging()
//!     .generate_tags(GenerateTagsRequest {
//!         country_code: "EGY".to_string(),
//!         manufacturer_code: "ZE".to_string(),
//!         name: "Zebra Printer".to_string(),
//!         description: None,
//!         count: 1,
//!         dry_run: false,
//!     })
//!     .await?;
//! println!("{}", outcome.data.assets[0].tag);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod dto;
pub mod error;
pub mod inventory;
pub mod tagging;
pub mod validation;

// Re-export main types for convenience
pub use dto::*;
pub use error::{ServiceError, ServiceResult};

// Re-export service traits and implementations
pub use catalog::{CatalogService, DefaultCatalogService};
pub use inventory::{DefaultInventoryService, InventoryService};
pub use tagging::{DefaultTaggingService, TaggingService};

use asset_tagger_store::RecordStore;
use std::sync::Arc;

/// Service registry that holds all service instances
///
/// This provides a convenient way to manage all services together
/// and ensures consistent dependency injection.
#[derive(Clone)]
pub struct ServiceRegistry {
    /// Tagging service
    pub tagging: Arc<dyn TaggingService>,
    /// Inventory service
    pub inventory: Arc<dyn InventoryService>,
    /// Catalog service
    pub catalog: Arc<dyn CatalogService>,
}

impl ServiceRegistry {
    /// Create a new service registry with default implementations sharing one store
    pub fn new(store: RecordStore) -> Self {
        Self {
            tagging: Arc::new(DefaultTaggingService::new(store.clone())),
            inventory: Arc::new(DefaultInventoryService::new(store.clone())),
            catalog: Arc::new(DefaultCatalogService::new(store)),
        }
    }

    /// Get the tagging service
    pub fn tagging(&self) -> &Arc<dyn TaggingService> {
        &self.tagging
    }

    /// Get the inventory service
    pub fn inventory(&self) -> &Arc<dyn InventoryService> {
        &self.inventory
    }

    /// Get the catalog service
    pub fn catalog(&self) -> &Arc<dyn CatalogService> {
        &self.catalog
    }
}
