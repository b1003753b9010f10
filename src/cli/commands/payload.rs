//! import, cat and write commands - File payloads

use std::io::Write as _;
use std::path::Path;

use anyhow::Result;

use super::{parse_target, resolve, Context};
use crate::ui::output;

/// Copy `path` into the file `target`, creating missing levels.
pub fn import(ctx: &Context, target: &str, path: &Path) -> Result<()> {
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    let file = resolve(&db, &loc, true)?.into_file()?;
    file.import_file(path)?;

    let filename = file.filename()?.unwrap_or_default();
    output::success(
        format!("Imported {} into {} as {}", path.display(), loc, filename),
        ctx.verbosity,
    );
    Ok(())
}

/// Write the raw payload of `target` to stdout.
///
/// Not affected by `--quiet`; the payload is the output.
pub fn cat(ctx: &Context, target: &str) -> Result<()> {
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    let file = resolve(&db, &loc, false)?.into_file()?;
    let data = file.read_raw()?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}

/// Store `text` in the file `target`, creating missing levels.
pub fn write(ctx: &Context, target: &str, text: &str, ext: &str) -> Result<()> {
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    let file = resolve(&db, &loc, true)?.into_file()?;
    file.write(text, ext)?;
    output::success(format!("Wrote {} bytes to {}", text.len(), loc), ctx.verbosity);
    Ok(())
}
