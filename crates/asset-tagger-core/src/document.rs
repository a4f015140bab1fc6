//! Whole-collection JSON documents
//!
//! Each collection is persisted as one pretty-printed JSON array. Decoding
//! never fails: a document that is not a JSON array reads as an empty
//! collection, and entries that do not decode are set aside untouched so
//! they can be written back on the next save. Both cases are reported back
//! as warnings.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::warn;

use crate::error::Result;

/// The three persisted documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `assets.json`
    Assets,
    /// `countries.json`
    Countries,
    /// `manufacturers.json`
    Manufacturers,
}

impl DocumentKind {
    /// All documents, in load order
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Assets,
        DocumentKind::Countries,
        DocumentKind::Manufacturers,
    ];

    /// File name of the document
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Assets => "assets.json",
            DocumentKind::Countries => "countries.json",
            DocumentKind::Manufacturers => "manufacturers.json",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Result of decoding a document
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    /// Entries that decoded successfully, in document order
    pub items: Vec<T>,
    /// Raw entries that did not decode, in document order
    pub rejected: Vec<Value>,
    /// Problems encountered while decoding
    pub warnings: Vec<String>,
}

impl<T> Decoded<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            rejected: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn empty_with(warning: String) -> Self {
        Self {
            warnings: vec![warning],
            ..Self::empty()
        }
    }
}

/// Decode a collection document
///
/// Empty or whitespace-only content is an empty collection without warnings.
pub fn decode_collection<T: DeserializeOwned>(kind: DocumentKind, content: &[u8]) -> Decoded<T> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Decoded::empty();
    }

    let value: Value = match serde_json::from_slice(content) {
        Ok(value) => value,
        Err(e) => {
            warn!(document = %kind, error = %e, "Malformed document, treating as empty");
            return Decoded::empty_with(format!("{} is not valid JSON ({}); treated as empty", kind, e));
        }
    };

    let Value::Array(entries) = value else {
        warn!(document = %kind, "Document is not a JSON array, treating as empty");
        return Decoded::empty_with(format!("{} is not a JSON array; treated as empty", kind));
    };

    let mut decoded = Decoded {
        items: Vec::with_capacity(entries.len()),
        ..Decoded::empty()
    };

    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<T>(entry.clone()) {
            Ok(item) => decoded.items.push(item),
            Err(e) => {
                warn!(document = %kind, index, error = %e, "Keeping malformed entry as is");
                decoded
                    .warnings
                    .push(format!("{} entry {} kept unchanged: {}", kind, index, e));
                decoded.rejected.push(entry);
            }
        }
    }

    decoded
}

/// Encode a collection as a pretty-printed JSON array
pub fn encode_collection<T: Serialize>(items: &[T]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(items)?)
}

/// Encode a collection followed by raw entries carried over from decoding
pub fn encode_collection_with<T: Serialize>(items: &[T], preserved: &[Value]) -> Result<Vec<u8>> {
    if preserved.is_empty() {
        return encode_collection(items);
    }

    let mut entries = items
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<Value>, _>>()?;
    entries.extend(preserved.iter().cloned());
    encode_collection(&entries)
}

/// The `tag` field of a raw asset entry, if it has one
pub fn raw_tag(entry: &Value) -> Option<&str> {
    entry.get("tag").and_then(Value::as_str)
}
