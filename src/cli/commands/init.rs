//! init command - Create a new store

use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::db::{Database, FsBackend};
use crate::ui::output;

/// Create a store at `path`. Re-running on an existing store is a no-op.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - Directory to create the store in
/// * `description` - Optional free-form description
pub fn init(ctx: &Context, path: &Path, description: Option<String>) -> Result<()> {
    let backend = FsBackend::init(path, description)
        .with_context(|| format!("Failed to initialize store at {}", path.display()))?;

    // Prove the new store opens before reporting success
    let db = Database::new(backend);
    db.connect()?;
    db.disconnect();

    output::success(
        format!("Initialized store at {}", path.display()),
        ctx.verbosity,
    );
    Ok(())
}
