//! create command - Get-or-create an entity path

use anyhow::Result;

use super::{parse_target, resolve, Context};
use crate::ui::output;

/// Create `target` and any missing parents. Existing levels are reused.
pub fn create(ctx: &Context, target: &str) -> Result<()> {
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    resolve(&db, &loc, true)?;
    output::success(format!("Created {} {}", loc.kind(), loc), ctx.verbosity);
    Ok(())
}
