//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens and connects the store named by `--db` or `default_db`
//! 2. Resolves its target path to an entity handle
//! 3. Calls the database API and formats the result
//!
//! Handlers never touch the store layout directly.

mod create;
mod delete;
mod init;
mod ls;
mod meta;
mod payload;

pub use create::create;
pub use delete::delete;
pub use init::init;
pub use ls::ls;
pub use meta::{meta_get, meta_replace, meta_set};
pub use payload::{cat, import, write};

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context as _, Result};

use crate::cli::args::{Command, MetaAction};
use crate::core::types::Location;
use crate::db::{Database, Entity, File, Fileset, Scan};
use crate::ui::output::Verbosity;

/// Execution context shared by all handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Store root, from `--db` or the user config.
    pub db: Option<PathBuf>,
    pub verbosity: Verbosity,
}

impl Context {
    /// Open and connect the configured store.
    pub fn open_db(&self) -> Result<Database> {
        let root = self
            .db
            .as_ref()
            .ok_or_else(|| anyhow!("No store given. Pass --db <path> or set default_db in the config"))?;
        let db = Database::open_fs(root);
        db.connect()
            .with_context(|| format!("Failed to open store at {}", root.display()))?;
        Ok(db)
    }
}

/// An entity at any level of the hierarchy.
#[derive(Debug, Clone)]
pub enum Target {
    Scan(Scan),
    Fileset(Fileset),
    File(File),
}

impl Target {
    pub fn entity(&self) -> &dyn Entity {
        match self {
            Target::Scan(scan) => scan,
            Target::Fileset(fileset) => fileset,
            Target::File(file) => file,
        }
    }

    pub fn into_file(self) -> Result<File> {
        match self {
            Target::File(file) => Ok(file),
            other => bail!(
                "'{}' is a {}, expected scan/fileset/file",
                other.entity().location(),
                other.entity().location().kind()
            ),
        }
    }
}

/// Parse a `scan[/fileset[/file]]` argument.
pub fn parse_target(target: &str) -> Result<Location> {
    Location::parse(target).with_context(|| format!("Invalid target '{}'", target))
}

/// Resolve `loc` to an entity handle.
///
/// With `create`, every missing level is created on the way down. Without
/// it a missing level is an error naming that level.
pub fn resolve(db: &Database, loc: &Location, create: bool) -> Result<Target> {
    let missing = |kind: &str, at: &str| anyhow!("{} not found: {}", kind, at);
    let components = loc.components();

    let scan = db
        .get_scan(components[0].as_str(), create)?
        .ok_or_else(|| missing("scan", components[0].as_str()))?;
    let Some(fileset_id) = components.get(1) else {
        return Ok(Target::Scan(scan));
    };

    let fileset = scan
        .get_fileset(fileset_id.as_str(), create)?
        .ok_or_else(|| missing("fileset", &format!("{}/{}", components[0], fileset_id)))?;
    let Some(file_id) = components.get(2) else {
        return Ok(Target::Fileset(fileset));
    };

    let file = fileset
        .get_file(file_id.as_str(), create)?
        .ok_or_else(|| missing("file", &loc.to_string()))?;
    Ok(Target::File(file))
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { path, description } => init(ctx, &path, description),
        Command::Ls { target } => ls(ctx, target.as_deref()),
        Command::Create { target } => create(ctx, &target),
        Command::Rm { target } => delete(ctx, &target),
        Command::Meta { action } => match action {
            MetaAction::Get { target, key } => meta_get(ctx, &target, key.as_deref()),
            MetaAction::Set { target, key, value } => meta_set(ctx, &target, &key, &value),
            MetaAction::Replace { target, json } => meta_replace(ctx, &target, &json),
        },
        Command::Import { target, path } => import(ctx, &target, &path),
        Command::Cat { target } => cat(ctx, &target),
        Command::Write { target, text, ext } => write(ctx, &target, &text, &ext),
    }
}
