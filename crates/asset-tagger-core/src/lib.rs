//! Core domain models and types for the asset tagger
//!
//! This crate contains the data structures and pure domain logic shared by
//! every other layer: assets and catalog entries, the tag format and the
//! sequential tag generator, the JSON document codec, and QR rendering.
//! Nothing in here performs I/O.

pub mod asset;
pub mod catalog;
pub mod document;
pub mod error;
pub mod qr;
pub mod tag;
pub mod types;

// Re-exports for convenience
pub use asset::{Asset, AssetBuilder};
pub use catalog::{CatalogEntry, Country, Manufacturer};
pub use document::{
    decode_collection, encode_collection, encode_collection_with, raw_tag, Decoded, DocumentKind,
};
pub use error::{Result, TaggerError};
pub use qr::{QrFormat, QrImage, QrRenderer};
pub use tag::{next_tag, next_tag_for_codes, parse_sequence, TagSequencer};
pub use types::{AssetTag, Code, MAX_SEQUENCE, SEQUENCE_WIDTH};
