//! core::metadata
//!
//! Entity metadata and file records.
//!
//! # Modules
//!
//! - [`schema`] - Document types (metadata map, file record)
//! - [`store`] - JSON document storage on the filesystem
//!
//! # Architecture
//!
//! Metadata is an arbitrary JSON object per entity. The filesystem backend
//! stores it as `metadata.json` inside the entity's directory. A missing
//! document is an empty map, and a missing key is simply absent.

pub mod schema;
pub mod store;

pub use schema::{
    metadata_to_json, parse_metadata, FileRecord, Metadata, MetadataError, PayloadKind,
    FILE_RECORD_KIND, SCHEMA_VERSION,
};
pub use store::{MetadataStore, StoreError};
