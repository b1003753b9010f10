//! core::metadata::schema
//!
//! Persisted document schemas.
//!
//! # Documents
//!
//! - [`Metadata`]: free-form key/value map attached to every entity. Values
//!   are arbitrary JSON (strings, numbers, booleans, null, arrays, objects).
//! - [`FileRecord`]: describes a file entity's current payload.
//!
//! # Schema Design
//!
//! The file record is:
//! - Self-describing with `kind` and `schema_version`
//! - Strictly parsed (unknown fields rejected)
//!
//! # Example
//!
//! ```
//! use romidb::core::metadata::schema::{parse_metadata, FileRecord, PayloadKind};
//!
//! let meta = parse_metadata(r#"{"camera": {"model": "RX0"}}"#).unwrap();
//! assert_eq!(meta["camera"]["model"], "RX0");
//!
//! let record = FileRecord::new("rgb_0001.jpg", PayloadKind::Binary, 1024);
//! let json = record.to_canonical_json().unwrap();
//! let parsed = FileRecord::parse(&json).unwrap();
//! assert_eq!(parsed.filename, "rgb_0001.jpg");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Free-form metadata map of one entity.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// The kind identifier for file records.
pub const FILE_RECORD_KIND: &str = "romidb.file-record";

/// Current file record schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from persisted document handling.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to parse document: {0}")]
    ParseError(String),

    #[error("metadata document must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("invalid kind '{found}', expected '{}'", FILE_RECORD_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("failed to serialize document: {0}")]
    SerializeError(String),
}

/// Parse a metadata document.
///
/// The top level must be a JSON object.
pub fn parse_metadata(json: &str) -> Result<Metadata, MetadataError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| MetadataError::ParseError(e.to_string()))?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(MetadataError::NotAnObject(json_type_name(&other))),
    }
}

/// Serialize a metadata map as pretty JSON.
pub fn metadata_to_json(metadata: &Metadata) -> Result<String, MetadataError> {
    serde_json::to_string_pretty(metadata).map_err(|e| MetadataError::SerializeError(e.to_string()))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// How a payload was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Written as UTF-8 text.
    Text,
    /// Written as raw bytes.
    Binary,
    /// Copied from an external file.
    Imported,
}

/// Record of a file entity's current payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRecord {
    pub kind: String,
    pub schema_version: u32,
    /// Name of the payload file inside the file entity's directory.
    pub filename: String,
    pub payload: PayloadKind,
    /// Payload length in bytes.
    pub size: u64,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(filename: impl Into<String>, payload: PayloadKind, size: u64) -> Self {
        Self {
            kind: FILE_RECORD_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            filename: filename.into(),
            payload,
            size,
            updated_at: Utc::now(),
        }
    }

    /// Parse and validate a record.
    pub fn parse(json: &str) -> Result<Self, MetadataError> {
        let record: FileRecord =
            serde_json::from_str(json).map_err(|e| MetadataError::ParseError(e.to_string()))?;

        if record.kind != FILE_RECORD_KIND {
            return Err(MetadataError::InvalidKind { found: record.kind });
        }
        if record.schema_version != SCHEMA_VERSION {
            return Err(MetadataError::UnsupportedVersion(record.schema_version));
        }

        Ok(record)
    }

    pub fn to_canonical_json(&self) -> Result<String, MetadataError> {
        serde_json::to_string(self).map_err(|e| MetadataError::SerializeError(e.to_string()))
    }
}
