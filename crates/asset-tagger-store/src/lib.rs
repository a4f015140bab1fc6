//! Document storage for the asset tagger
//!
//! This crate persists the asset, country and manufacturer collections as
//! whole JSON documents, including:
//! - A backend trait for versioned document storage
//! - A GitHub contents API backend (documents are files, versions are blob SHAs)
//! - A local directory backend with atomic writes
//! - An in-memory backend for tests
//! - The record store that reads from the remote, falls back to local files
//!   when the remote is unreachable, and mirrors every write locally
//!
//! # Example
//!
//! ```rust,no_run
//! use asset_tagger_store::{LocalFileBackend, RecordStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RecordStore::new(Arc::new(LocalFileBackend::new("data")));
//!
//! let mut session = store.open().await?;
//! println!("{} assets", session.assets().len());
//! session.save_assets().await?;
//! # Ok(())
//! # }
//! ```

// Re-export core domain types for convenience
pub use asset_tagger_core;

pub mod backend;
pub mod error;
pub mod github;
pub mod local;
pub mod memory;
pub mod record_store;

pub use backend::{DocumentBackend, StoredDocument};
pub use error::{StoreError, StoreResult};
pub use github::{GitHubBackend, GitHubConfig, DEFAULT_API_URL};
pub use local::LocalFileBackend;
pub use memory::MemoryBackend;
pub use record_store::{
    BackendHealth, RecordStore, RecordStoreConfig, StorageMode, StoreSession, StoreStatus,
};

/// Storage layer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default local data directory
pub const DEFAULT_DATA_DIR: &str = "data";
