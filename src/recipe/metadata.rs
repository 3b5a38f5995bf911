//! Package metadata exported to consumers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

use crate::config::PackageSection;
use crate::recipe::identity::PackageIdentity;
use crate::recipe::options::BuildOptions;
use crate::recipe::settings::Settings;

/// Metadata file written at the root of the package folder.
pub const PACKAGE_INFO_FILENAME: &str = "package-info.json";

const LIB_DIRS: &[&str] = &["lib", "lib64"];
const BIN_DIRS: &[&str] = &["bin"];

/// What downstream consumers need to link against the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: Option<String>,
    pub cmake_target_name: String,
    pub libs: Vec<String>,
    pub libdirs: Vec<String>,
    pub bindirs: Vec<String>,
    pub includedirs: Vec<String>,
    pub license: Option<String>,
    pub user: Option<String>,
    pub topics: Vec<String>,
    pub requires: Vec<String>,
    pub options: Vec<(String, bool)>,
    pub settings: Vec<(String, String)>,
}

/// Collect produced libraries, build the metadata and write it to
/// `<package>/package-info.json`.
pub fn export_metadata(
    package_dir: &Path,
    identity: &PackageIdentity,
    version: Option<&str>,
    package: &PackageSection,
    options: &BuildOptions,
    settings: &Settings,
) -> Result<PackageInfo> {
    let libs = collect_libs(package_dir)?;

    let mut settings_out = vec![
        ("os".to_string(), settings.os.to_string()),
        ("build_type".to_string(), settings.build_type.clone()),
        ("arch".to_string(), settings.arch.clone()),
    ];
    if let Some(compiler) = &settings.compiler {
        settings_out.push(("compiler".to_string(), compiler.clone()));
    }
    if let Some(cppstd) = settings.compiler_cppstd {
        settings_out.push(("compiler.cppstd".to_string(), cppstd.to_string()));
    }

    let info = PackageInfo {
        name: identity.name().to_string(),
        version: version.map(str::to_string),
        cmake_target_name: identity.cmake_target_name(),
        libs,
        libdirs: existing_dirs(package_dir, LIB_DIRS),
        bindirs: existing_dirs(package_dir, BIN_DIRS),
        includedirs: existing_dirs(package_dir, &["include"]),
        license: package.license.clone(),
        user: package.default_user.clone(),
        topics: package.topics.clone(),
        requires: package.requires.clone(),
        options: options
            .entries()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
        settings: settings_out,
    };

    fs::create_dir_all(package_dir)
        .with_context(|| format!("creating package directory '{}'", package_dir.display()))?;
    let path = package_dir.join(PACKAGE_INFO_FILENAME);
    let bytes = serde_json::to_vec_pretty(&info).context("serializing package metadata")?;
    fs::write(&path, bytes)
        .with_context(|| format!("writing package metadata '{}'", path.display()))?;

    info!(
        "[metadata] {} exports {} ({} libs)",
        info.name,
        info.cmake_target_name,
        info.libs.len()
    );
    Ok(info)
}

/// Library names found directly inside the package's lib and bin folders.
///
/// `libfoo.so.1.2`, `libfoo.a` and `foo.lib` all yield `foo`.
pub fn collect_libs(package_dir: &Path) -> Result<Vec<String>> {
    let mut libs = BTreeSet::new();

    for dir in LIB_DIRS.iter().chain(BIN_DIRS) {
        let root = package_dir.join(dir);
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&root).min_depth(1).max_depth(1) {
            let entry = entry
                .with_context(|| format!("scanning library directory '{}'", root.display()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str().and_then(library_name) {
                libs.insert(name);
            }
        }
    }

    Ok(libs.into_iter().collect())
}

fn library_name(file_name: &str) -> Option<String> {
    let stem = if let Some(pos) = file_name.find(".so.") {
        &file_name[..pos]
    } else {
        [".so", ".a", ".lib", ".dylib", ".dll"]
            .iter()
            .find_map(|ext| file_name.strip_suffix(ext))?
    };

    let name = if file_name.ends_with(".lib") || file_name.ends_with(".dll") {
        stem
    } else {
        stem.strip_prefix("lib").unwrap_or(stem)
    };

    (!name.is_empty()).then(|| name.to_string())
}

fn existing_dirs(package_dir: &Path, candidates: &[&str]) -> Vec<String> {
    candidates
        .iter()
        .filter(|dir| package_dir.join(dir).is_dir())
        .map(|dir| dir.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::identity::derive_identity;
    use tempfile::TempDir;

    #[test]
    fn test_library_name() {
        assert_eq!(library_name("libstag_lwm2m.so"), Some("stag_lwm2m".to_string()));
        assert_eq!(library_name("libstag_lwm2m.so.1.2.0"), Some("stag_lwm2m".to_string()));
        assert_eq!(library_name("libfoo.a"), Some("foo".to_string()));
        assert_eq!(library_name("libfoo.dylib"), Some("foo".to_string()));
        assert_eq!(library_name("foo.lib"), Some("foo".to_string()));
        assert_eq!(library_name("foo.dll"), Some("foo".to_string()));
        assert_eq!(library_name("README.md"), None);
        assert_eq!(library_name("cmake"), None);
    }

    #[test]
    fn test_collect_libs_dedupes_and_sorts() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib");
        fs::create_dir_all(lib.join("cmake/Foo")).unwrap();
        fs::write(lib.join("libzeta.so"), "").unwrap();
        fs::write(lib.join("libzeta.so.1"), "").unwrap();
        fs::write(lib.join("libalpha.a"), "").unwrap();
        fs::write(lib.join("cmake/Foo/libnested.a"), "").unwrap();

        assert_eq!(collect_libs(temp.path()).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_export_metadata_writes_json() {
        let temp = TempDir::new().unwrap();
        let package_dir = temp.path().join("package");
        fs::create_dir_all(package_dir.join("lib")).unwrap();
        fs::create_dir_all(package_dir.join("include")).unwrap();
        fs::write(package_dir.join("lib/libstag_lwm2m.so"), "").unwrap();

        let identity = derive_identity("set(THIS Stag_LWM2M)", Path::new("CMakeLists.txt")).unwrap();
        let section = PackageSection {
            license: Some("Apache 2.0".to_string()),
            requires: vec!["gtest/[~1.11]".to_string()],
            ..PackageSection::default()
        };

        let info = export_metadata(
            &package_dir,
            &identity,
            Some("0.3.1"),
            &section,
            &BuildOptions::default(),
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(info.cmake_target_name, "Stag_Lwm2m::Stag_Lwm2m");
        assert_eq!(info.libs, vec!["stag_lwm2m"]);
        assert_eq!(info.libdirs, vec!["lib"]);
        assert_eq!(info.includedirs, vec!["include"]);

        let bytes = fs::read(package_dir.join(PACKAGE_INFO_FILENAME)).unwrap();
        let parsed: PackageInfo = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, info);
    }
}
