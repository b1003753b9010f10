//! rm command - Delete an entity recursively

use anyhow::{bail, Result};

use super::{parse_target, resolve, Context, Target};
use crate::db::Entity;
use crate::ui::output;

/// Delete `target` with everything below it.
pub fn delete(ctx: &Context, target: &str) -> Result<()> {
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    let id = loc.id().as_str();

    match loc.parent() {
        None => db.delete_scan(id)?,
        Some(parent) => match resolve(&db, &parent, false)? {
            Target::Scan(scan) => scan.delete_fileset(id)?,
            Target::Fileset(fileset) => fileset.delete_file(id)?,
            Target::File(file) => bail!("'{}' cannot have children", file.location()),
        },
    }

    output::success(format!("Deleted {} {}", loc.kind(), loc), ctx.verbosity);
    Ok(())
}
