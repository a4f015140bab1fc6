//! Inventory service
//!
//! Read access to the asset collection (lookup, filtered listing, recent
//! assets, statistics, QR rendering) plus editing of the mutable asset fields.

use asset_tagger_core::{Asset, QrFormat, QrImage, QrRenderer};
use asset_tagger_store::{RecordStore, StoreStatus};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument};

use crate::dto::{
    ListAssetsRequest, ListAssetsResponse, Outcome, StatsResponse, UpdateAssetRequest,
    DEFAULT_LIST_LIMIT, DEFAULT_RECENT_LIMIT,
};
use crate::error::{ServiceError, ServiceResult};
use crate::validation::{find_asset, normalize_limit, parse_lookup_code, parse_lookup_tag};

/// Trait for inventory operations
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Get an asset by tag
    async fn get_asset(&self, tag: &str) -> ServiceResult<Outcome<Asset>>;

    /// List assets matching the filters, newest first
    async fn list_assets(&self, request: ListAssetsRequest) -> ServiceResult<Outcome<ListAssetsResponse>>;

    /// Most recently created assets
    async fn recent_assets(&self, limit: Option<usize>) -> ServiceResult<Outcome<Vec<Asset>>>;

    /// Inventory statistics
    async fn stats(&self) -> ServiceResult<Outcome<StatsResponse>>;

    /// Edit the name or description of an asset
    async fn update_asset(&self, tag: &str, request: UpdateAssetRequest) -> ServiceResult<Outcome<Asset>>;

    /// Render the QR code of an existing asset
    async fn render_qr(&self, tag: &str, format: QrFormat) -> ServiceResult<QrImage>;

    /// Storage mode and backend health
    async fn storage_status(&self) -> StoreStatus;
}

/// Default implementation of InventoryService
pub struct DefaultInventoryService {
    store: RecordStore,
    renderer: QrRenderer,
}

impl DefaultInventoryService {
    /// Create a new inventory service
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            renderer: QrRenderer::default(),
        }
    }

    /// Use a custom QR renderer
    pub fn with_renderer(mut self, renderer: QrRenderer) -> Self {
        self.renderer = renderer;
        self
    }
}

/// Newest first; ties broken by tag
fn sort_newest_first(assets: &mut [Asset]) {
    assets.sort_by(|a, b| {
        b.date_created
            .cmp(&a.date_created)
            .then_with(|| a.tag.cmp(&b.tag))
    });
}

fn matches_text(asset: &Asset, needle: &str) -> bool {
    asset.tag.to_lowercase().contains(needle)
        || asset.name.to_lowercase().contains(needle)
        || asset.description.to_lowercase().contains(needle)
}

#[async_trait]
impl InventoryService for DefaultInventoryService {
    #[instrument(skip(self))]
    async fn get_asset(&self, tag: &str) -> ServiceResult<Outcome<Asset>> {
        let tag = parse_lookup_tag(tag)?;
        let mut session = self.store.open().await?;

        let index = find_asset(session.assets(), &tag)
            .ok_or_else(|| ServiceError::NotFound(format!("Asset {} not found", tag)))?;
        let asset = session.assets()[index].clone();

        Ok(Outcome::new(asset, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn list_assets(&self, request: ListAssetsRequest) -> ServiceResult<Outcome<ListAssetsResponse>> {
        let country = request
            .country_code
            .as_deref()
            .map(parse_lookup_code)
            .transpose()?;
        let manufacturer = request
            .manufacturer_code
            .as_deref()
            .map(parse_lookup_code)
            .transpose()?;
        let needle = request
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        let limit = normalize_limit(request.limit, DEFAULT_LIST_LIMIT);

        let mut session = self.store.open().await?;
        let mut matching: Vec<Asset> = session
            .assets()
            .iter()
            .filter(|a| country.as_ref().map_or(true, |c| &a.country_code == c))
            .filter(|a| manufacturer.as_ref().map_or(true, |m| &a.manufacturer_code == m))
            .filter(|a| needle.as_deref().map_or(true, |n| matches_text(a, n)))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);

        let total = matching.len();
        let assets: Vec<Asset> = matching
            .into_iter()
            .skip(request.offset)
            .take(limit)
            .collect();
        let has_more = request.offset + assets.len() < total;

        debug!(total, returned = assets.len(), "Listed assets");
        Ok(Outcome::new(
            ListAssetsResponse {
                assets,
                total,
                offset: request.offset,
                limit,
                has_more,
            },
            session.take_warnings(),
        ))
    }

    #[instrument(skip(self))]
    async fn recent_assets(&self, limit: Option<usize>) -> ServiceResult<Outcome<Vec<Asset>>> {
        let limit = normalize_limit(limit, DEFAULT_RECENT_LIMIT);
        let mut session = self.store.open().await?;

        let mut assets = session.assets().to_vec();
        sort_newest_first(&mut assets);
        assets.truncate(limit);

        Ok(Outcome::new(assets, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> ServiceResult<Outcome<StatsResponse>> {
        let mut session = self.store.open().await?;
        let assets = session.assets();

        let countries: HashSet<_> = assets.iter().map(|a| &a.country_code).collect();
        let manufacturers: HashSet<_> = assets.iter().map(|a| &a.manufacturer_code).collect();
        let mut per_prefix = BTreeMap::new();
        for asset in assets {
            *per_prefix.entry(asset.prefix()).or_insert(0usize) += 1;
        }

        let stats = StatsResponse {
            total_assets: assets.len(),
            countries_in_use: countries.len(),
            manufacturers_in_use: manufacturers.len(),
            catalog_countries: session.countries().len(),
            catalog_manufacturers: session.manufacturers().len(),
            per_prefix,
            last_created: assets.iter().map(|a| a.date_created).max(),
        };

        Ok(Outcome::new(stats, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn update_asset(&self, tag: &str, request: UpdateAssetRequest) -> ServiceResult<Outcome<Asset>> {
        let tag = parse_lookup_tag(tag)?;

        if let Some(requested) = request.tag.as_deref() {
            let unchanged = parse_lookup_tag(requested)
                .map(|t| t.key() == tag.key())
                .unwrap_or(false);
            if !unchanged {
                return Err(ServiceError::ValidationFailed(
                    "Asset tags cannot be changed".to_string(),
                ));
            }
        }

        let mut session = self.store.open().await?;
        let index = find_asset(session.assets(), &tag)
            .ok_or_else(|| ServiceError::NotFound(format!("Asset {} not found", tag)))?;

        let mut asset = session.assets()[index].clone();
        if let Some(name) = request.name {
            asset.set_name(name)?;
        }
        if let Some(description) = request.description {
            asset.set_description(description)?;
        }

        if asset != session.assets()[index] {
            session.assets_mut()[index] = asset.clone();
            session.save_assets().await?;
            info!(tag = %asset.tag, "Updated asset");
        }

        Ok(Outcome::new(asset, session.take_warnings()))
    }

    #[instrument(skip(self))]
    async fn render_qr(&self, tag: &str, format: QrFormat) -> ServiceResult<QrImage> {
        let tag = parse_lookup_tag(tag)?;
        let stored_tag = {
            let session = self.store.open().await?;
            let index = find_asset(session.assets(), &tag)
                .ok_or_else(|| ServiceError::NotFound(format!("Asset {} not found", tag)))?;
            session.assets()[index].tag.clone()
        };

        let image = self.renderer.render(&stored_tag, format)?;
        debug!(tag = %stored_tag, bytes = image.bytes.len(), "Rendered QR code");
        Ok(image)
    }

    async fn storage_status(&self) -> StoreStatus {
        self.store.status().await
    }
}
