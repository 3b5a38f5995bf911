//! Versioned `tar.zst` archive of the package folder.
//!
//! Entries are sorted and ownership/mtime are zeroed so two archives of the
//! same package tree are byte-identical.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tar::Builder as TarBuilder;
use tracing::info;
use walkdir::WalkDir;

use crate::recipe::identity::PackageIdentity;

const ZSTD_LEVEL: i32 = 3;

/// `<name>-<version>.tar.zst`, or `<name>.tar.zst` without a version.
pub fn archive_file_name(identity: &PackageIdentity, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{}-{}.tar.zst", identity.name(), version),
        None => format!("{}.tar.zst", identity.name()),
    }
}

/// Archive `package_dir` into `out_dir`, returning the archive path.
pub fn archive_package(
    package_dir: &Path,
    out_dir: &Path,
    identity: &PackageIdentity,
    version: Option<&str>,
) -> Result<PathBuf> {
    if !package_dir.is_dir() {
        bail!("package directory '{}' does not exist", package_dir.display());
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating archive directory '{}'", out_dir.display()))?;

    let out = out_dir.join(archive_file_name(identity, version));
    create_tar_zst(package_dir, &out)
        .with_context(|| format!("archiving package into '{}'", out.display()))?;

    info!("[archive] {}", out.display());
    Ok(out)
}

fn create_tar_zst(package_dir: &Path, out_path: &Path) -> Result<()> {
    let file = File::create(out_path)
        .with_context(|| format!("creating archive file '{}'", out_path.display()))?;
    let mut tar = TarBuilder::new(zstd::stream::Encoder::new(file, ZSTD_LEVEL)?);

    // Directory order from read_dir is unspecified; sort by name at every level.
    let walker = WalkDir::new(package_dir)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry
            .with_context(|| format!("walking package directory '{}'", package_dir.display()))?;
        let path = entry.path();
        let name = path
            .strip_prefix(package_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let meta = fs::symlink_metadata(path)?;
        let mut header = normalized_header(&meta);

        if meta.file_type().is_symlink() {
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_link_name(fs::read_link(path)?)?;
            header.set_cksum();
            tar.append_data(&mut header, &name, io::empty())?;
        } else if meta.is_dir() {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_cksum();
            tar.append_data(&mut header, &name, io::empty())?;
        } else if meta.is_file() {
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(meta.len());
            header.set_cksum();
            tar.append_data(&mut header, &name, File::open(path)?)?;
        }
    }

    tar.into_inner()
        .context("finishing tar stream")?
        .finish()
        .context("finishing zstd stream")?;
    Ok(())
}

/// Header with ownership and timestamps zeroed; only the mode survives.
fn normalized_header(meta: &fs::Metadata) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_size(0);
    header.set_mode(mode_of(meta));
    header
}

#[cfg(unix)]
fn mode_of(md: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(md: &fs::Metadata) -> u32 {
    if md.is_dir() {
        0o755
    } else {
        0o644
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::identity::derive_identity;
    use std::io::Read;
    use tempfile::TempDir;

    fn identity() -> PackageIdentity {
        derive_identity("set(THIS Stag_LWM2M)", Path::new("CMakeLists.txt")).unwrap()
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(
            archive_file_name(&identity(), Some("1.0.0")),
            "stag_lwm2m-1.0.0.tar.zst"
        );
        assert_eq!(archive_file_name(&identity(), None), "stag_lwm2m.tar.zst");
    }

    #[test]
    fn test_archive_contains_package_tree() {
        let temp = TempDir::new().unwrap();
        let package_dir = temp.path().join("package");
        fs::create_dir_all(package_dir.join("licenses")).unwrap();
        fs::write(package_dir.join("licenses/LICENSE"), "Apache").unwrap();

        let out = archive_package(&package_dir, temp.path(), &identity(), Some("1.0.0")).unwrap();

        let decoder = zstd::stream::Decoder::new(File::open(&out).unwrap()).unwrap();
        let mut archive = tar::Archive::new(decoder);
        let mut found = false;
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.path().unwrap().to_string_lossy() == "licenses/LICENSE" {
                let mut body = String::new();
                entry.read_to_string(&mut body).unwrap();
                assert_eq!(body, "Apache");
                found = true;
            }
        }
        assert!(found);
    }

    #[test]
    fn test_archive_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let package_dir = temp.path().join("package");
        fs::create_dir_all(package_dir.join("lib")).unwrap();
        fs::write(package_dir.join("lib/libfoo.a"), "obj").unwrap();

        let first = archive_package(&package_dir, &temp.path().join("a"), &identity(), None).unwrap();
        let second = archive_package(&package_dir, &temp.path().join("b"), &identity(), None).unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn test_missing_package_dir() {
        let temp = TempDir::new().unwrap();
        assert!(archive_package(&temp.path().join("nope"), temp.path(), &identity(), None).is_err());
    }
}
