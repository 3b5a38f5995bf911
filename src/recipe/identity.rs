//! Package identity derived from the build descriptor.
//!
//! The descriptor (`CMakeLists.txt`) names the library with a single
//! `set(THIS <name>)` line. The name is trimmed and lowercased to form the
//! package name; the CMake target exported to consumers is its camel-cased form
//! doubled as `Name::Name`.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::IdentityError;

/// File name of the build descriptor inside a recipe directory.
pub const DESCRIPTOR_FILENAME: &str = "CMakeLists.txt";

const MARKER: &str = "set(THIS ";

/// Canonical package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    name: String,
}

impl PackageIdentity {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `foo_bar` → `Foo_Bar::Foo_Bar`
    pub fn cmake_target_name(&self) -> String {
        let camel = to_camel_case(&self.name);
        format!("{camel}::{camel}")
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Read the descriptor in `recipe_dir` and derive the package identity.
pub fn load_identity(recipe_dir: &Path) -> Result<PackageIdentity> {
    let path = recipe_dir.join(DESCRIPTOR_FILENAME);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading build descriptor '{}'", path.display()))?;
    Ok(derive_identity(&content, &path)?)
}

/// Derive the identity from descriptor text.
///
/// Exactly one marker line is accepted; `path` is only used for error messages.
pub fn derive_identity(content: &str, path: &Path) -> Result<PackageIdentity, IdentityError> {
    let matches: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| marker_value(line).map(|value| (idx + 1, value)))
        .collect();

    match matches.as_slice() {
        [] => Err(IdentityError::Missing {
            path: path.to_path_buf(),
        }),
        [(line, value)] => {
            let name = value.trim().to_lowercase();
            if name.is_empty() {
                return Err(IdentityError::Empty {
                    path: path.to_path_buf(),
                    line: *line,
                });
            }
            Ok(PackageIdentity { name })
        }
        many => Err(IdentityError::Ambiguous {
            path: path.to_path_buf(),
            count: many.len(),
            lines: many.iter().map(|(line, _)| *line).collect(),
        }),
    }
}

/// Value between `set(THIS ` and the last `)` on the line, if the line has one.
fn marker_value(line: &str) -> Option<&str> {
    let start = line.find(MARKER)? + MARKER.len();
    let rest = &line[start..];
    let end = rest.rfind(')')?;
    Some(&rest[..end])
}

/// Capitalize each `_`/whitespace separated word and rejoin with `_`.
fn to_camel_case(input: &str) -> String {
    input
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("_")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
