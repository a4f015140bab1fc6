//! Storage-specific error types and conversions
//!
//! This module provides error types for document storage, covering the
//! remote contents API, the local data directory and decoding problems.

use thiserror::Error;

/// Result type alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Remote store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote store rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Version token did not match the stored document
    #[error("Version conflict: {0}")]
    Conflict(String),

    /// Remote store answered with something unexpected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local file system error
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Domain error from core crate
    #[error("Domain error: {0}")]
    Domain(#[from] asset_tagger_core::TaggerError),
}

impl StoreError {
    /// Check if this error is a version conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    /// Check if the remote is unusable and the local fallback should take over
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Connection(_) | StoreError::Authentication(_)
        )
    }
}

/// Convert HTTP client errors
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::InvalidResponse(format!("{}", err))
        } else if err.is_builder() {
            StoreError::Configuration(format!("{}", err))
        } else {
            StoreError::Connection(format!("{}", err))
        }
    }
}

/// Convert file system errors
impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(format!("{}", err))
    }
}

/// Convert serde_json errors
impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(format!("{}", err))
    }
}

/// Convert URL parse errors
impl From<url::ParseError> for StoreError {
    fn from(err: url::ParseError) -> Self {
        StoreError::Configuration(format!("Invalid URL: {}", err))
    }
}
