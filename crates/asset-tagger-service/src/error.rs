//! Service-layer error types
//!
//! This module defines error types specific to the service layer,
//! mapping domain and storage errors to service-level errors.

use asset_tagger_core::TaggerError;
use asset_tagger_store::StoreError;
use thiserror::Error;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Service-layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Asset or catalog entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tag or catalog code already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Neither the remote store nor the local files could be used
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TaggerError> for ServiceError {
    fn from(err: TaggerError) -> Self {
        match err {
            TaggerError::InvalidCode { .. }
            | TaggerError::InvalidTag(_)
            | TaggerError::SequenceOverflow(_)
            | TaggerError::ValidationError(_) => ServiceError::ValidationFailed(err.to_string()),
            TaggerError::DuplicateTag(tag) => {
                ServiceError::AlreadyExists(format!("Asset tag {} already exists", tag))
            }
            TaggerError::DuplicateCode { kind, code } => {
                ServiceError::AlreadyExists(format!("{} code {} already exists", kind, code))
            }
            TaggerError::SerializationError(msg) | TaggerError::QrError(msg) => {
                ServiceError::Internal(msg)
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(_)
            | StoreError::Authentication(_)
            | StoreError::NotFound(_)
            | StoreError::Conflict(_)
            | StoreError::InvalidResponse(_)
            | StoreError::Io(_) => ServiceError::Storage(err.to_string()),
            StoreError::Serialization(msg) | StoreError::Configuration(msg) => {
                ServiceError::Internal(msg)
            }
            StoreError::Domain(err) => ServiceError::from(err),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(format!("Serialization error: {}", err))
    }
}
