//! Packaging: install the build tree and copy license files.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::filesystem::recreate_dir;
use crate::recipe::layout::BuildLayout;
use crate::tool::cmake::CMake;
use crate::tool::ExternalTool;

/// License files copied from the recipe directory when present.
pub const LICENSE_FILES: &[&str] = &["LICENSE", "NOTICE", "AUTHORS"];

/// Subdirectory of the package folder receiving [`LICENSE_FILES`].
pub const LICENSES_DIR: &str = "licenses";

/// Install into a freshly emptied package folder, then copy license files.
///
/// Returns the license file names that were copied.
pub fn package(cmake: &dyn ExternalTool, layout: &BuildLayout) -> Result<Vec<String>> {
    recreate_dir(&layout.package)?;
    CMake::new(cmake, layout).install()?;
    copy_licenses(&layout.recipe_dir, &layout.package)
}

/// Copy [`LICENSE_FILES`] from `src` into `<package>/licenses/`.
///
/// Missing files are skipped.
pub fn copy_licenses(src: &Path, package: &Path) -> Result<Vec<String>> {
    let dst = package.join(LICENSES_DIR);
    let mut copied = Vec::new();

    for name in LICENSE_FILES {
        let from = src.join(name);
        if !from.is_file() {
            debug!("no {name} in {}", src.display());
            continue;
        }
        fs::create_dir_all(&dst)
            .with_context(|| format!("creating licenses directory '{}'", dst.display()))?;
        fs::copy(&from, dst.join(name))
            .with_context(|| format!("copying license file '{}'", from.display()))?;
        copied.push(name.to_string());
    }

    info!("[package] copied {} license files", copied.len());
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::fake::FakeTool;
    use tempfile::TempDir;

    #[test]
    fn test_copy_licenses_skips_missing() {
        let temp = TempDir::new().unwrap();
        let recipe = temp.path().join("recipe");
        fs::create_dir_all(&recipe).unwrap();
        fs::write(recipe.join("LICENSE"), "Apache 2.0").unwrap();
        fs::write(recipe.join("AUTHORS"), "Hahn-Schickard").unwrap();

        let package_dir = temp.path().join("package");
        let copied = copy_licenses(&recipe, &package_dir).unwrap();

        assert_eq!(copied, vec!["LICENSE", "AUTHORS"]);
        assert_eq!(
            fs::read_to_string(package_dir.join("licenses/LICENSE")).unwrap(),
            "Apache 2.0"
        );
        assert!(!package_dir.join("licenses/NOTICE").exists());
    }

    #[test]
    fn test_copy_licenses_none_present() {
        let temp = TempDir::new().unwrap();
        let copied = copy_licenses(temp.path(), &temp.path().join("package")).unwrap();
        assert!(copied.is_empty());
        assert!(!temp.path().join("package/licenses").exists());
    }

    #[test]
    fn test_package_stops_when_install_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("LICENSE"), "x").unwrap();
        let layout = BuildLayout::cmake(temp.path(), "Release");
        let cmake = FakeTool::new("cmake").with_handler(|_| Ok(1));

        assert!(package(&cmake, &layout).is_err());
        assert!(!layout.package.join("licenses").exists());
    }

    #[test]
    fn test_package_clears_previous_contents() {
        let temp = TempDir::new().unwrap();
        let layout = BuildLayout::cmake(temp.path(), "Release");
        fs::create_dir_all(layout.package.join("lib")).unwrap();
        fs::create_dir_all(layout.package.join("licenses")).unwrap();
        fs::write(layout.package.join("lib/libold.so"), "").unwrap();
        fs::write(layout.package.join("licenses/LICENSE"), "old").unwrap();

        let copied = package(&FakeTool::new("cmake"), &layout).unwrap();

        assert!(copied.is_empty());
        assert!(layout.package.is_dir());
        assert!(!layout.package.join("lib/libold.so").exists());
        assert!(!layout.package.join("licenses").exists());
    }
}
