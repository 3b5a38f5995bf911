//! Exclusive lock files guarding a working directory.
//!
//! Both pipelines reset paths they own at start, so two runs against the same
//! directory would clobber each other. Holding a [`WorkspaceLock`] makes the
//! second run fail fast instead.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// RAII guard: unlocks and removes the lock file on drop.
#[derive(Debug)]
pub struct WorkspaceLock {
    _file: File,
    path: PathBuf,
}

impl WorkspaceLock {
    /// Take an exclusive, non-blocking lock on `path`.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating lock directory '{}'", parent.display()))?;
        }

        // Never unlink a lock file before locking it: a second process could
        // create a fresh file at the same path and lock that one instead.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating lock file '{}'", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            drop(file);
            anyhow::bail!(
                "workspace is locked by another process: {}",
                path.display()
            );
        }

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_lock_fails_while_held() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/.lock");

        let first = WorkspaceLock::acquire(&path).unwrap();
        assert!(WorkspaceLock::acquire(&path).is_err());
        drop(first);

        assert!(!path.exists());
        let again = WorkspaceLock::acquire(&path).unwrap();
        assert_eq!(again.path(), path.as_path());
    }
}
