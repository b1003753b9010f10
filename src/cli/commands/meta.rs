//! meta command - Read and change entity metadata

use anyhow::{bail, Context as _, Result};
use serde_json::Value;

use super::{parse_target, resolve, Context};
use crate::core::metadata::{metadata_to_json, parse_metadata};
use crate::ui::output;

/// Print the whole metadata map, or the value of `key`.
///
/// A missing key prints nothing and fails, so scripts can test for it.
pub fn meta_get(ctx: &Context, target: &str, key: Option<&str>) -> Result<()> {
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    let target = resolve(&db, &loc, false)?;
    let entity = target.entity();

    match key {
        None => {
            let metadata = entity.get_metadata()?;
            output::print(metadata_to_json(&metadata)?, ctx.verbosity);
        }
        Some(key) => match entity.get_metadata_key(key)? {
            Some(value) => output::print(serde_json::to_string_pretty(&value)?, ctx.verbosity),
            None => bail!("key '{}' not set on {}", key, loc),
        },
    }
    Ok(())
}

/// Set `key` to the JSON `value`.
pub fn meta_set(ctx: &Context, target: &str, key: &str, value: &str) -> Result<()> {
    let value: Value = serde_json::from_str(value)
        .with_context(|| format!("Value for '{}' is not valid JSON: {}", key, value))?;
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    resolve(&db, &loc, false)?.entity().set_metadata_key(key, value)?;
    output::success(format!("Set {} on {}", key, loc), ctx.verbosity);
    Ok(())
}

/// Replace the whole metadata map with the JSON object `json`.
pub fn meta_replace(ctx: &Context, target: &str, json: &str) -> Result<()> {
    let metadata = parse_metadata(json).context("Metadata must be a JSON object")?;
    let loc = parse_target(target)?;
    let db = ctx.open_db()?;
    resolve(&db, &loc, false)?
        .entity()
        .replace_metadata(metadata)?;
    output::success(format!("Replaced metadata of {}", loc), ctx.verbosity);
    Ok(())
}
