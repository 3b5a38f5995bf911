//! Filesystem helpers shared by the recipe engine and coverage pipeline.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Copy the tree under `src` into `dst`, recreating symlinks rather than
/// following them. Existing files in `dst` are overwritten.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.with_context(|| format!("walking '{}'", src.display()))?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("creating directory '{}'", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("copying '{}'", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link = fs::read_link(src)?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(&link, dst)
        .with_context(|| format!("creating symlink '{}'", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).with_context(|| format!("copying '{}'", src.display()))?;
    Ok(())
}

/// Copy `src` (file or directory) to `dst`.
pub fn copy_entry(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        return copy_dir_recursive(src, dst);
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    fs::copy(src, dst).with_context(|| format!("copying '{}'", src.display()))?;
    Ok(())
}

/// Remove a directory tree if present, then create it empty.
pub fn recreate_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("removing directory '{}'", path.display()))?;
    }
    fs::create_dir_all(path)
        .with_context(|| format!("creating directory '{}'", path.display()))
}

/// Remove a file if present.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        fs::remove_file(path)
            .with_context(|| format!("removing file '{}'", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_dir_recursive_nested() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/file.hpp"), "x").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink("b/file.hpp", src.join("a/link.hpp")).unwrap();

        let dst = temp.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a/b/file.hpp")).unwrap(), "x");
        #[cfg(unix)]
        assert!(dst.join("a/link.hpp").is_symlink());
    }

    #[test]
    fn test_recreate_dir_clears_contents() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("report");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.html"), "old").unwrap();

        recreate_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_file_if_exists() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("trace.info");
        remove_file_if_exists(&file).unwrap();
        fs::write(&file, "TN:\n").unwrap();
        remove_file_if_exists(&file).unwrap();
        assert!(!file.exists());
    }
}
