//! cli
//!
//! Command-line interface for romidb.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging and load the user configuration
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It resolves which store to open and hands the
//! [`crate::db::Database`] to the command handlers; every mutation goes
//! through the database API and its locking.

pub mod args;
pub mod commands;
pub mod logging;

pub use args::Cli;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::Verbosity;
use commands::Context;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.debug);

    let config = Config::load().context("Failed to load user configuration")?;

    // CLI flag takes precedence over the config file.
    let ctx = Context {
        db: cli.db.or_else(|| config.default_db().map(|p| p.to_path_buf())),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
