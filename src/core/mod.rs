//! core
//!
//! Core domain types, schemas, and storage primitives.
//!
//! # Modules
//!
//! - [`types`] - Strong types: EntityId, Location
//! - [`paths`] - Centralized path routing for filesystem stores
//! - [`ops`] - Store locking and atomic writes
//! - [`metadata`] - Metadata and file-record documents
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid ids from reaching storage
//! - Persisted documents are strict and self-describing
//! - Every write is atomic with respect to readers

pub mod config;
pub mod metadata;
pub mod ops;
pub mod paths;
pub mod types;
