//! romidb - A filesystem database for plant scan datasets
//!
//! A store holds *scans*; a scan holds *filesets*; a fileset holds *files*.
//! Every level carries a JSON metadata map and files carry one payload. Any
//! number of connections, across threads or processes, may read and write
//! the same store.
//!
//! # Architecture
//!
//! - [`core`] - Strong types, path routing, documents, locking, configuration
//! - [`db`] - The database API: `Database`, `Scan`, `Fileset`, `File`
//! - [`runner`] - Runs processing tasks over the scans of a database
//! - [`cli`] - Command-line interface layer
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every mutation runs under the store-wide lock; contention is reported as
//!    [`db::DbError::Busy`], never waited on
//! 2. Readers never observe a partially written document or payload
//! 3. An entity id maps to exactly one persisted location

pub mod cli;
pub mod core;
pub mod db;
pub mod runner;
pub mod ui;
