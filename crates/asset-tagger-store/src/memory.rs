//! In-memory backend
//!
//! By default behaves like a versioned remote store: every write bumps a
//! version token and replacing a document requires the current token. An
//! unversioned store accepts every write, like a local directory. Used in
//! tests and for ephemeral deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::backend::{DocumentBackend, StoredDocument};
use crate::error::{StoreError, StoreResult};

/// Versioned document store held in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: RwLock<HashMap<String, (Vec<u8>, String)>>,
    next_version: AtomicU64,
    writes: AtomicUsize,
    unavailable: AtomicBool,
    unversioned: bool,
}

impl MemoryBackend {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store without version checks
    pub fn unversioned() -> Self {
        Self {
            unversioned: true,
            ..Self::default()
        }
    }

    /// Store a document without version checks, returning its new version
    pub async fn insert(&self, path: &str, content: impl Into<Vec<u8>>) -> String {
        let version = self.bump();
        self.documents
            .write()
            .await
            .insert(path.to_string(), (content.into(), version.clone()));
        version
    }

    /// Current content of a document
    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.documents
            .read()
            .await
            .get(path)
            .map(|(content, _)| content.clone())
    }

    /// Simulate an unreachable store
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful writes through [`DocumentBackend::put`]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn bump(&self) -> String {
        format!("v{}", self.next_version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, path: &str) -> StoreResult<Option<StoredDocument>> {
        self.check_available()?;
        Ok(self
            .documents
            .read()
            .await
            .get(path)
            .map(|(content, version)| {
                StoredDocument::new(
                    content.clone(),
                    (!self.unversioned).then(|| version.clone()),
                )
            }))
    }

    async fn put(
        &self,
        path: &str,
        content: &[u8],
        version: Option<&str>,
        _message: &str,
    ) -> StoreResult<Option<String>> {
        self.check_available()?;

        let mut documents = self.documents.write().await;
        let current = documents.get(path).map(|(_, v)| v.as_str());
        if !self.unversioned && current != version {
            return Err(StoreError::Conflict(format!(
                "{}: expected version {:?}, found {:?}",
                path, version, current
            )));
        }

        let new_version = self.bump();
        documents.insert(path.to_string(), (content.to_vec(), new_version.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok((!self.unversioned).then_some(new_version))
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check_available()
    }
}
