//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--db <path>`: Store to operate on (overrides `default_db`)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! # Targets
//!
//! Entities are addressed as `scan[/fileset[/file]]`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// romidb - A filesystem database for plant scan datasets
#[derive(Parser, Debug)]
#[command(name = "romidb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store root (defaults to `default_db` from the user config)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new store
    #[command(after_help = "\
EXAMPLES:
    romidb init ./data --description \"greenhouse 2019\"")]
    Init {
        /// Directory to create the store in
        path: PathBuf,

        /// Free-form description stored in romidb.toml
        #[arg(long)]
        description: Option<String>,
    },

    /// List scans, the filesets of a scan, or the files of a fileset
    #[command(after_help = "\
EXAMPLES:
    romidb ls                  # all scans
    romidb ls scan1            # filesets of scan1
    romidb ls scan1/images     # files of scan1/images")]
    Ls {
        /// scan or scan/fileset
        target: Option<String>,
    },

    /// Create an entity and any missing parents
    Create {
        /// scan[/fileset[/file]]
        target: String,
    },

    /// Delete an entity and everything below it
    Rm {
        /// scan[/fileset[/file]]
        target: String,
    },

    /// Read or change metadata
    Meta {
        #[command(subcommand)]
        action: MetaAction,
    },

    /// Copy an external file into a file entity
    Import {
        /// scan/fileset/file
        target: String,

        /// Source file
        path: PathBuf,
    },

    /// Print the content of a file entity
    Cat {
        /// scan/fileset/file
        target: String,
    },

    /// Write text into a file entity
    Write {
        /// scan/fileset/file
        target: String,

        /// Text to store
        text: String,

        /// Extension of the stored filename
        #[arg(long, default_value = "")]
        ext: String,
    },
}

/// Metadata subcommands.
#[derive(Subcommand, Debug)]
pub enum MetaAction {
    /// Print the metadata map, or one key
    Get {
        /// scan[/fileset[/file]]
        target: String,

        /// Key to print
        key: Option<String>,
    },

    /// Set one key to a JSON value
    #[command(after_help = "\
EXAMPLES:
    romidb meta set scan1 species '\"arabidopsis\"'
    romidb meta set scan1/images/rgb exposure 0.01")]
    Set {
        /// scan[/fileset[/file]]
        target: String,

        key: String,

        /// JSON value
        value: String,
    },

    /// Replace the whole metadata map with a JSON object
    Replace {
        /// scan[/fileset[/file]]
        target: String,

        /// JSON object
        json: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["romidb", "ls", "--db", "/tmp/x", "-q"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/x")));
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Ls { target: None }));
    }

    #[test]
    fn write_ext_defaults_to_empty() {
        let cli = Cli::try_parse_from(["romidb", "write", "s/f/x", "hi"]).unwrap();
        match cli.command {
            Command::Write { ext, .. } => assert_eq!(ext, ""),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
