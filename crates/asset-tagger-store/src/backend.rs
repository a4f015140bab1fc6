//! Backend trait abstraction for document persistence
//!
//! This module defines the DocumentBackend trait that abstracts the storage of
//! whole JSON documents addressed by path, allowing for different
//! implementations (GitHub contents API, local files, in-memory).

use async_trait::async_trait;

use crate::error::StoreResult;

/// A document as returned by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Raw document bytes
    pub content: Vec<u8>,

    /// Opaque version token required to replace the document, when the
    /// backend supports optimistic concurrency
    pub version: Option<String>,
}

impl StoredDocument {
    /// Create a new stored document
    pub fn new(content: impl Into<Vec<u8>>, version: Option<String>) -> Self {
        Self {
            content: content.into(),
            version,
        }
    }
}

/// Backend trait for document persistence operations
///
/// Implementations must be thread-safe (Send + Sync) for use in async contexts.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Short backend name used in logs and health output
    fn name(&self) -> &'static str;

    /// Fetch the current content and version of a document
    ///
    /// # Returns
    /// * `Ok(Some(StoredDocument))` - The document if it exists
    /// * `Ok(None)` - If no document exists at that path
    /// * `Err(StoreError)` - For connectivity, authentication or other errors
    async fn fetch(&self, path: &str) -> StoreResult<Option<StoredDocument>>;

    /// Replace a document
    ///
    /// # Arguments
    /// * `path` - Document path
    /// * `content` - New full content
    /// * `version` - Version token from the prior fetch; `None` creates the document
    /// * `message` - Change description (used as commit message by versioned stores)
    ///
    /// # Returns
    /// * `Ok(Option<String>)` - The new version token, if the backend has one
    /// * `Err(StoreError::Conflict)` - If the version token is stale
    /// * `Err(StoreError)` - For other errors
    async fn put(
        &self,
        path: &str,
        content: &[u8],
        version: Option<&str>,
        message: &str,
    ) -> StoreResult<Option<String>>;

    /// Health check - verify the backend is operational
    async fn health_check(&self) -> StoreResult<()>;
}
