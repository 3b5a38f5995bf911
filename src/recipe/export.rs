//! Export sources: copy the recipe's source entries into the build tree.

use anyhow::{Context, Result};
use glob::Pattern;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::filesystem::{copy_entry, recreate_dir};

/// Top-level entries exported when `package.toml` does not list any.
pub const DEFAULT_EXPORTS_SOURCES: &[&str] = &["cmake*", "includes*", "sources*", "CMakeLists.txt"];

/// Copy every top-level entry of `recipe_dir` whose name matches one of
/// `patterns` into `dest`, which is recreated first.
///
/// Returns the exported entry names, sorted.
pub fn export_sources(recipe_dir: &Path, patterns: &[String], dest: &Path) -> Result<Vec<String>> {
    let compiled = patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid exports_sources pattern '{p}'")))
        .collect::<Result<Vec<_>>>()?;

    recreate_dir(dest)?;

    let mut exported = Vec::new();
    for entry in fs::read_dir(recipe_dir)
        .with_context(|| format!("reading recipe directory '{}'", recipe_dir.display()))?
    {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !compiled.iter().any(|p| p.matches(&name)) {
            continue;
        }
        copy_entry(&entry.path(), &dest.join(&name))
            .with_context(|| format!("exporting '{name}'"))?;
        debug!("exported {name}");
        exported.push(name);
    }

    exported.sort();
    info!("[export] {} entries into {}", exported.len(), dest.display());
    Ok(exported)
}
