//! ls command - List the children of a level

use anyhow::{bail, Result};

use super::{parse_target, resolve, Context, Target};
use crate::db::Entity;
use crate::ui::output;

/// List scans, the filesets of a scan, or the files of a fileset.
///
/// Files are shown with their stored filename when they have a payload.
pub fn ls(ctx: &Context, target: Option<&str>) -> Result<()> {
    let db = ctx.open_db()?;

    let lines: Vec<String> = match target {
        None => db
            .get_scans()?
            .iter()
            .map(|scan| scan.id().to_string())
            .collect(),
        Some(target) => {
            let loc = parse_target(target)?;
            match resolve(&db, &loc, false)? {
                Target::Scan(scan) => scan
                    .get_filesets()?
                    .iter()
                    .map(|fileset| fileset.id().to_string())
                    .collect(),
                Target::Fileset(fileset) => {
                    let mut lines = Vec::new();
                    for file in fileset.get_files()? {
                        lines.push(match file.filename()? {
                            Some(name) => format!("{}\t{}", file.id(), name),
                            None => file.id().to_string(),
                        });
                    }
                    lines
                }
                Target::File(_) => bail!("'{}' is a file and has no children", loc),
            }
        }
    };

    output::debug(format!("{} entries", lines.len()), ctx.verbosity);
    for line in lines {
        output::print(line, ctx.verbosity);
    }
    Ok(())
}
