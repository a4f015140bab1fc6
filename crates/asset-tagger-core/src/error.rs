//! Error types for the asset tagger domain

use thiserror::Error;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, TaggerError>;

/// Main error type for domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaggerError {
    /// Country or manufacturer code is empty or malformed
    #[error("Invalid code '{code}': {reason}")]
    InvalidCode { code: String, reason: String },

    /// Tag does not match COUNTRY-MANUFACTURER-NNNNN
    #[error("Invalid tag '{0}'")]
    InvalidTag(String),

    /// Tag already present in the collection
    #[error("Duplicate tag: {0}")]
    DuplicateTag(String),

    /// Catalog code already present
    #[error("Duplicate {kind} code: {code}")]
    DuplicateCode { kind: &'static str, code: String },

    /// Sequence space for a prefix is exhausted
    #[error("Sequence overflow for prefix {0}")]
    SequenceOverflow(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// QR encoding or image rendering failed
    #[error("QR rendering error: {0}")]
    QrError(String),
}

impl TaggerError {
    /// Build an invalid code error
    pub fn invalid_code(code: impl Into<String>, reason: impl Into<String>) -> Self {
        TaggerError::InvalidCode {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TaggerError {
    fn from(err: serde_json::Error) -> Self {
        TaggerError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_code_display() {
        let err = TaggerError::DuplicateCode {
            kind: "country",
            code: "EGY".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate country code: EGY");
    }

    #[test]
    fn test_invalid_code_display() {
        let err = TaggerError::invalid_code("", "code cannot be empty");
        assert_eq!(err.to_string(), "Invalid code '': code cannot be empty");
    }
}
