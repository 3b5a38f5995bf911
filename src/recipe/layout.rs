//! Folder layout for one recipe evaluation.

use std::path::{Path, PathBuf};

/// Root of everything a recipe run writes, relative to the recipe directory.
pub const BUILD_ROOT: &str = "build";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Recipe directory holding the descriptor and license files.
    pub recipe_dir: PathBuf,
    /// Exported sources handed to CMake.
    pub source: PathBuf,
    /// CMake binary tree: `build/<BuildType>`.
    pub build: PathBuf,
    /// Generated toolchain files: `build/<BuildType>/generators`.
    pub generators: PathBuf,
    /// Install prefix and package contents.
    pub package: PathBuf,
    pub build_type: String,
}

impl BuildLayout {
    /// CMake-style layout keyed by build type.
    pub fn cmake(recipe_dir: &Path, build_type: &str) -> Self {
        let root = recipe_dir.join(BUILD_ROOT);
        let build = root.join(build_type);
        Self {
            recipe_dir: recipe_dir.to_path_buf(),
            source: root.join("source"),
            generators: build.join("generators"),
            build,
            package: root.join("package"),
            build_type: build_type.to_string(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.recipe_dir.join(BUILD_ROOT)
    }

    pub fn toolchain_file(&self) -> PathBuf {
        self.generators.join("toolchain.cmake")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root().join(".recipe.lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmake_layout() {
        let layout = BuildLayout::cmake(Path::new("/work/lib"), "Debug");
        assert_eq!(layout.build, PathBuf::from("/work/lib/build/Debug"));
        assert_eq!(
            layout.toolchain_file(),
            PathBuf::from("/work/lib/build/Debug/generators/toolchain.cmake")
        );
        assert_eq!(layout.package, PathBuf::from("/work/lib/build/package"));
        assert_eq!(layout.source, PathBuf::from("/work/lib/build/source"));
    }
}
