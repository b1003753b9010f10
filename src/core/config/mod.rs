//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! There are two configuration scopes:
//! - **User**: settings for the command-line tool and the runner
//! - **Store**: `romidb.toml` at the root of every store
//!
//! # Precedence
//!
//! For user settings (later overrides earlier):
//! 1. Default values
//! 2. User config file
//! 3. CLI flags (not handled here)
//!
//! # User Config Locations
//!
//! Searched in order:
//! 1. `$ROMIDB_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/romidb/config.toml`
//! 3. `~/.romidb/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use romidb::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! if let Some(db) = config.default_db() {
//!     println!("Default store: {}", db.display());
//! }
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RunnerDefaults, StoreConfig, STORE_FORMAT_VERSION};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::ops::atomic::write_atomic;
use crate::core::paths::StorePaths;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded user configuration.
///
/// Accessors apply defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    /// Path the config was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load the user configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or fails
    /// validation. A missing file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load the user configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let global: GlobalConfig = read_toml(path)?;
        global.validate()?;
        Ok(Self {
            global,
            path: Some(path.to_path_buf()),
        })
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("ROMIDB_CONFIG") {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("romidb/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".romidb/config.toml"));
        }
        paths
    }

    /// Path the config was loaded from, `None` when defaults are in use.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Store used when none is given on the command line.
    pub fn default_db(&self) -> Option<&Path> {
        self.global.default_db.as_deref()
    }

    /// Whether the runner keeps going after a scan fails.
    ///
    /// Defaults to `false`.
    pub fn runner_continue_on_error(&self) -> bool {
        self.global
            .runner
            .as_ref()
            .and_then(|r| r.continue_on_error)
            .unwrap_or(false)
    }

    // =========================================================================
    // Store config
    // =========================================================================

    /// Read and validate `<root>/romidb.toml`.
    pub fn read_store(paths: &StorePaths) -> Result<StoreConfig, ConfigError> {
        let config: StoreConfig = read_toml(&paths.store_config_path())?;
        config.validate()?;
        Ok(config)
    }

    /// Write `<root>/romidb.toml` atomically.
    pub fn write_store(paths: &StorePaths, config: &StoreConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = paths.store_config_path();
        write_toml_atomic(&path, config)?;
        Ok(path)
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a config file atomically, creating parent directories.
fn write_toml_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    write_atomic(path, contents.as_bytes()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
