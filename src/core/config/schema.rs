//! core::config::schema
//!
//! Configuration schema types.
//!
//! # User Config
//!
//! Located at (in order of precedence):
//! 1. `$ROMIDB_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/romidb/config.toml`
//! 3. `~/.romidb/config.toml` (canonical write location)
//!
//! # Store Config
//!
//! Located at `<root>/romidb.toml`. Its presence marks a directory as a
//! store.
//!
//! # Validation
//!
//! Config values are validated after parsing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Store format version written by this release.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// User configuration.
///
/// # Example
///
/// ```toml
/// default_db = "/data/romi/db"
///
/// [runner]
/// continue_on_error = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Store used when `--db` is not given
    pub default_db: Option<PathBuf>,

    /// Runner defaults
    pub runner: Option<RunnerDefaults>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(db) = &self.default_db {
            if db.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_db cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Runner defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerDefaults {
    /// Keep processing the remaining scans after a scan fails
    pub continue_on_error: Option<bool>,
}

/// Per-store configuration, stored at the store root.
///
/// # Example
///
/// ```toml
/// format_version = 1
/// description = "greenhouse scans, spring campaign"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// On-disk layout version
    pub format_version: u32,

    /// Free-form description of the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            format_version: STORE_FORMAT_VERSION,
            description: None,
        }
    }
}

impl StoreConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unsupported format version.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format_version != STORE_FORMAT_VERSION {
            return Err(ConfigError::InvalidValue(format!(
                "unsupported store format_version {}, supported: {}",
                self.format_version, STORE_FORMAT_VERSION
            )));
        }
        Ok(())
    }
}
