//! Ignore-pattern list for coverage filtering.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default ignore file name, looked up under `<root>/utility/`.
pub const IGNORE_FILENAME: &str = "Coverage_Ignores.txt";

/// Read one glob pattern per line, trimmed, in file order.
///
/// Blank lines are skipped. A missing file is an empty list.
pub fn load_ignore_patterns(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        debug!("no ignore file at {}", path.display());
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading ignore file '{}'", path.display()))?;
    Ok(parse_ignore_patterns(&raw))
}

pub fn parse_ignore_patterns(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
