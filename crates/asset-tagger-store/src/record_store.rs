//! Record store over a remote document backend with a local mirror
//!
//! A [`RecordStore`] serializes every read-modify-write cycle in the process.
//! [`RecordStore::open`] takes the lock and loads the assets, countries and
//! manufacturers documents into a [`StoreSession`]; the lock is held by the
//! session and released when it is dropped.
//!
//! Entries that fail to decode are kept as raw JSON and written back after
//! the decoded ones, so a save never drops a record it could not read.

use asset_tagger_core::{
    decode_collection, encode_collection_with, raw_tag, Asset, CatalogEntry, Country,
    DocumentKind, Manufacturer,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::backend::DocumentBackend;
use crate::error::{StoreError, StoreResult};

/// Record store settings
#[derive(Debug, Clone, Default)]
pub struct RecordStoreConfig {
    /// Directory prefix for documents in the remote repository
    pub remote_path_prefix: String,

    /// Prefix for change messages (commit messages on the remote)
    pub message_prefix: Option<String>,

    /// Populate empty catalogs with the default countries and manufacturers
    pub seed_defaults: bool,
}

impl RecordStoreConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote path prefix
    pub fn remote_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.remote_path_prefix = prefix.into();
        self
    }

    /// Set the change message prefix
    pub fn message_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.message_prefix = if prefix.trim().is_empty() {
            None
        } else {
            Some(prefix)
        };
        self
    }

    /// Enable or disable catalog seeding
    pub fn seed_defaults(mut self, enabled: bool) -> Self {
        self.seed_defaults = enabled;
        self
    }

    fn remote_path(&self, kind: DocumentKind) -> String {
        let prefix = self.remote_path_prefix.trim_matches('/');
        if prefix.is_empty() {
            kind.file_name().to_string()
        } else {
            format!("{}/{}", prefix, kind.file_name())
        }
    }

    fn message(&self, kind: DocumentKind, creating: bool) -> String {
        let action = if creating { "Create" } else { "Update" };
        match &self.message_prefix {
            Some(prefix) => format!("{} {} {}", prefix.trim(), action, kind),
            None => format!("{} {}", action, kind),
        }
    }
}

/// Where documents are read from and written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Remote store with a local mirror
    Remote,
    /// Local files only
    LocalOnly,
}

/// Health of a single backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendHealth {
    /// Backend name
    pub backend: String,
    /// Whether the health check passed
    pub healthy: bool,
    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BackendHealth {
    async fn probe(backend: &dyn DocumentBackend) -> Self {
        match backend.health_check().await {
            Ok(()) => Self {
                backend: backend.name().to_string(),
                healthy: true,
                message: None,
            },
            Err(e) => Self {
                backend: backend.name().to_string(),
                healthy: false,
                message: Some(e.to_string()),
            },
        }
    }
}

/// Storage status for health reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    /// Configured mode
    pub mode: StorageMode,
    /// Remote backend health, when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<BackendHealth>,
    /// Local backend health
    pub local: BackendHealth,
}

/// Process-wide entry point to the persisted collections
#[derive(Clone)]
pub struct RecordStore {
    remote: Option<Arc<dyn DocumentBackend>>,
    local: Arc<dyn DocumentBackend>,
    config: RecordStoreConfig,
    lock: Arc<Mutex<()>>,
}

impl RecordStore {
    /// Create a local-only store
    pub fn new(local: Arc<dyn DocumentBackend>) -> Self {
        Self {
            remote: None,
            local,
            config: RecordStoreConfig::default(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Use a remote backend as the primary store
    pub fn with_remote(mut self, remote: Arc<dyn DocumentBackend>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Set the store configuration
    pub fn with_config(mut self, config: RecordStoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Configured mode
    pub fn mode(&self) -> StorageMode {
        if self.remote.is_some() {
            StorageMode::Remote
        } else {
            StorageMode::LocalOnly
        }
    }

    /// Check the configured backends
    pub async fn status(&self) -> StoreStatus {
        let remote = match &self.remote {
            Some(remote) => Some(BackendHealth::probe(remote.as_ref()).await),
            None => None,
        };

        StoreStatus {
            mode: self.mode(),
            remote,
            local: BackendHealth::probe(self.local.as_ref()).await,
        }
    }

    /// Lock the store and load all documents
    #[instrument(skip(self), fields(mode = ?self.mode()))]
    pub async fn open(&self) -> StoreResult<StoreSession> {
        let guard = self.lock.clone().lock_owned().await;

        let mut session = StoreSession {
            _guard: guard,
            remote: self.remote.clone(),
            local: self.local.clone(),
            config: self.config.clone(),
            remote_available: self.remote.is_some(),
            versions: HashMap::new(),
            preserved: HashMap::new(),
            assets: Vec::new(),
            countries: Vec::new(),
            manufacturers: Vec::new(),
            warnings: Vec::new(),
        };

        session.assets = session.load(DocumentKind::Assets).await?.unwrap_or_default();

        // Seeding only applies to documents that do not exist yet; an
        // emptied catalog stays empty
        let seed = self.config.seed_defaults;
        session.countries = match session.load(DocumentKind::Countries).await? {
            Some(countries) => countries,
            None if seed => {
                info!("Seeding default countries");
                Country::defaults()
            }
            None => Vec::new(),
        };
        session.manufacturers = match session.load(DocumentKind::Manufacturers).await? {
            Some(manufacturers) => manufacturers,
            None if seed => {
                info!("Seeding default manufacturers");
                Manufacturer::defaults()
            }
            None => Vec::new(),
        };

        debug!(
            assets = session.assets.len(),
            countries = session.countries.len(),
            manufacturers = session.manufacturers.len(),
            "Store session opened"
        );
        Ok(session)
    }
}

/// Loaded collections plus exclusive access to the store
///
/// Mutate the collections in place and call the matching `save_*` method to
/// persist them. Dropping the session without saving discards the changes.
pub struct StoreSession {
    _guard: OwnedMutexGuard<()>,
    remote: Option<Arc<dyn DocumentBackend>>,
    local: Arc<dyn DocumentBackend>,
    config: RecordStoreConfig,
    remote_available: bool,
    versions: HashMap<DocumentKind, Option<String>>,
    preserved: HashMap<DocumentKind, Vec<Value>>,
    assets: Vec<Asset>,
    countries: Vec<Country>,
    manufacturers: Vec<Manufacturer>,
    warnings: Vec<String>,
}

impl StoreSession {
    /// Loaded assets
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Loaded assets, mutable
    pub fn assets_mut(&mut self) -> &mut Vec<Asset> {
        &mut self.assets
    }

    /// Loaded countries
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Loaded countries, mutable
    pub fn countries_mut(&mut self) -> &mut Vec<Country> {
        &mut self.countries
    }

    /// Loaded manufacturers
    pub fn manufacturers(&self) -> &[Manufacturer] {
        &self.manufacturers
    }

    /// Loaded manufacturers, mutable
    pub fn manufacturers_mut(&mut self) -> &mut Vec<Manufacturer> {
        &mut self.manufacturers
    }

    /// Every tag currently in the store, including entries that did not decode
    pub fn existing_tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.assets
            .iter()
            .map(|a| a.tag.as_str())
            .chain(self.undecoded_tags())
    }

    /// Tags of stored asset entries that did not decode
    pub fn undecoded_tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.preserved_entries(DocumentKind::Assets)
            .iter()
            .filter_map(raw_tag)
    }

    /// Non-fatal problems encountered so far
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Take the accumulated warnings
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Whether the remote is still in use for this session
    pub fn remote_in_use(&self) -> bool {
        self.remote.is_some() && self.remote_available
    }

    /// Persist the assets document
    pub async fn save_assets(&mut self) -> StoreResult<()> {
        let content =
            encode_collection_with(&self.assets, self.preserved_entries(DocumentKind::Assets))?;
        self.save(DocumentKind::Assets, content).await
    }

    /// Persist the countries document
    pub async fn save_countries(&mut self) -> StoreResult<()> {
        let content =
            encode_collection_with(&self.countries, self.preserved_entries(DocumentKind::Countries))?;
        self.save(DocumentKind::Countries, content).await
    }

    /// Persist the manufacturers document
    pub async fn save_manufacturers(&mut self) -> StoreResult<()> {
        let content = encode_collection_with(
            &self.manufacturers,
            self.preserved_entries(DocumentKind::Manufacturers),
        )?;
        self.save(DocumentKind::Manufacturers, content).await
    }

    fn preserved_entries(&self, kind: DocumentKind) -> &[Value] {
        self.preserved.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Load a document; `None` when it does not exist
    async fn load<T: DeserializeOwned>(&mut self, kind: DocumentKind) -> StoreResult<Option<Vec<T>>> {
        let Some(content) = self.fetch_content(kind).await? else {
            return Ok(None);
        };
        let decoded = decode_collection::<T>(kind, &content);
        self.warnings.extend(decoded.warnings);
        if !decoded.rejected.is_empty() {
            self.preserved.insert(kind, decoded.rejected);
        }
        Ok(Some(decoded.items))
    }

    async fn fetch_content(&mut self, kind: DocumentKind) -> StoreResult<Option<Vec<u8>>> {
        if let Some(remote) = self.remote.clone() {
            if self.remote_available {
                let path = self.config.remote_path(kind);
                match remote.fetch(&path).await {
                    Ok(Some(doc)) => {
                        self.versions.insert(kind, doc.version);
                        return Ok(Some(doc.content));
                    }
                    Ok(None) => {
                        self.versions.insert(kind, None);
                        return Ok(None);
                    }
                    Err(e) if e.is_unavailable() => self.fall_back(remote.name(), &e),
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(self.local.fetch(kind.file_name()).await?.map(|doc| doc.content))
    }

    #[instrument(skip(self, content), fields(document = %kind, bytes = content.len()))]
    async fn save(&mut self, kind: DocumentKind, content: Vec<u8>) -> StoreResult<()> {
        if let Some(remote) = self.remote.clone() {
            if self.remote_available {
                match self.put_remote(remote.as_ref(), kind, &content).await {
                    Ok(()) => {}
                    Err(e) if e.is_unavailable() => self.fall_back(remote.name(), &e),
                    Err(e) => return Err(e),
                }
            }
        }

        let message = self.config.message(kind, false);
        self.local
            .put(kind.file_name(), &content, None, &message)
            .await?;

        info!(document = %kind, remote = self.remote_in_use(), "Document saved");
        Ok(())
    }

    async fn put_remote(
        &mut self,
        remote: &dyn DocumentBackend,
        kind: DocumentKind,
        content: &[u8],
    ) -> StoreResult<()> {
        let path = self.config.remote_path(kind);
        let version = self.versions.get(&kind).cloned().flatten();
        let message = self.config.message(kind, version.is_none());

        let new_version = match remote.put(&path, content, version.as_deref(), &message).await {
            Ok(v) => v,
            Err(StoreError::Conflict(detail)) => {
                warn!(
                    document = %kind,
                    detail = %detail,
                    "Remote document changed since it was loaded, overwriting"
                );
                let current = remote.fetch(&path).await?.and_then(|doc| doc.version);
                let message = self.config.message(kind, current.is_none());
                remote
                    .put(&path, content, current.as_deref(), &message)
                    .await?
            }
            Err(e) => return Err(e),
        };

        self.versions.insert(kind, new_version);
        Ok(())
    }

    fn fall_back(&mut self, backend: &str, err: &StoreError) {
        warn!(backend, error = %err, "Remote store unavailable, using local files");
        self.remote_available = false;
        self.warnings.push(format!(
            "Remote store unavailable ({}); using local files",
            err
        ));
    }
}
