//! CMake driver: configure, build and install through an [`ExternalTool`].

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::{run_checked, ExternalTool};
use crate::recipe::layout::BuildLayout;
use crate::recipe::toolchain::ToolchainSettings;

/// Drives one CMake build tree described by a [`BuildLayout`].
pub struct CMake<'a> {
    tool: &'a dyn ExternalTool,
    layout: &'a BuildLayout,
}

impl<'a> CMake<'a> {
    pub fn new(tool: &'a dyn ExternalTool, layout: &'a BuildLayout) -> Self {
        Self { tool, layout }
    }

    /// `cmake -S <source> -B <build> -DCMAKE_TOOLCHAIN_FILE=... -D<cache vars>`
    pub fn configure(&self, toolchain: &ToolchainSettings) -> Result<()> {
        let mut args = vec![
            "-S".to_string(),
            path_arg(&self.layout.source),
            "-B".to_string(),
            path_arg(&self.layout.build),
            format!(
                "-DCMAKE_TOOLCHAIN_FILE={}",
                path_arg(&self.layout.toolchain_file())
            ),
            format!("-DCMAKE_BUILD_TYPE={}", self.layout.build_type),
        ];
        args.extend(
            toolchain
                .cache_variables()
                .map(|(key, value)| format!("-D{key}={value}")),
        );

        info!("[build] configuring {}", self.layout.build.display());
        run_checked(self.tool, &args).context("configuring CMake build tree")
    }

    /// `cmake --build <build> --config <BuildType>`
    pub fn build(&self) -> Result<()> {
        let args = vec![
            "--build".to_string(),
            path_arg(&self.layout.build),
            "--config".to_string(),
            self.layout.build_type.clone(),
        ];

        info!("[build] compiling {}", self.layout.build_type);
        run_checked(self.tool, &args).context("building CMake project")
    }

    /// `cmake --install <build> --prefix <package> --config <BuildType>`
    pub fn install(&self) -> Result<()> {
        let args = vec![
            "--install".to_string(),
            path_arg(&self.layout.build),
            "--prefix".to_string(),
            path_arg(&self.layout.package),
            "--config".to_string(),
            self.layout.build_type.clone(),
        ];

        info!("[package] installing into {}", self.layout.package.display());
        run_checked(self.tool, &args).context("installing CMake project")
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::options::BuildOptions;
    use crate::tool::fake::FakeTool;
    use std::path::PathBuf;

    fn layout() -> BuildLayout {
        BuildLayout::cmake(&PathBuf::from("/recipe"), "Release")
    }

    #[test]
    fn test_configure_passes_toolchain_and_cache_variables() {
        let tool = FakeTool::new("cmake");
        let layout = layout();
        let toolchain = ToolchainSettings::generate(&BuildOptions::default(), None);

        CMake::new(&tool, &layout).configure(&toolchain).unwrap();

        let calls = tool.calls();
        let args = &calls[0];
        assert_eq!(args[0], "-S");
        assert_eq!(args[1], "/recipe/build/source");
        assert_eq!(args[3], "/recipe/build/Release");
        assert!(args.contains(
            &"-DCMAKE_TOOLCHAIN_FILE=/recipe/build/Release/generators/toolchain.cmake".to_string()
        ));
        assert!(args.contains(&"-DCMAKE_POLICY_DEFAULT_CMP0077=NEW".to_string()));
    }

    #[test]
    fn test_install_targets_package_folder() {
        let tool = FakeTool::new("cmake");
        let layout = layout();

        CMake::new(&tool, &layout).install().unwrap();

        assert_eq!(
            tool.calls()[0],
            vec![
                "--install",
                "/recipe/build/Release",
                "--prefix",
                "/recipe/build/package",
                "--config",
                "Release"
            ]
        );
    }

    #[test]
    fn test_build_failure_is_fatal() {
        let tool = FakeTool::new("cmake").with_handler(|_| Ok(1));
        let layout = layout();

        let err = CMake::new(&tool, &layout).build().unwrap_err();
        assert!(err
            .downcast_ref::<crate::error::ToolInvocationError>()
            .is_some());
    }
}
