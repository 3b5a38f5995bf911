//! Recipe engine: turn a CMake project into a validated, packaged artifact.
//!
//! Stages run strictly in order and any failure is terminal:
//!
//! ```text
//! Recipe::evaluate    identity → validate → configure_options
//! Recipe::create      export → generate_toolchain → build → package
//!                     → export_metadata → archive
//! ```
//!
//! Evaluation only reads the descriptor. Creation writes under
//! `<recipe_dir>/build/` and holds an exclusive lock on it while running.
//!
//! # Example
//!
//! ```rust,ignore
//! use package_builder::config::PackageConfig;
//! use package_builder::recipe::Recipe;
//! use package_builder::tool::SystemTool;
//!
//! let config = PackageConfig::load(&recipe_dir.join("package.toml"))?;
//! let recipe = Recipe::evaluate(&recipe_dir, &config, config.settings()?, &[], None)?;
//! let artifact = recipe.create(&SystemTool::resolve("cmake", None))?;
//! println!("{}", artifact.info.cmake_target_name);
//! ```

pub mod archive;
pub mod export;
pub mod identity;
pub mod layout;
pub mod metadata;
pub mod options;
pub mod package;
pub mod settings;
pub mod toolchain;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{PackageConfig, PackageSection};
use crate::lock::WorkspaceLock;
use crate::tool::cmake::CMake;
use crate::tool::ExternalTool;

use identity::{load_identity, PackageIdentity};
use layout::BuildLayout;
use metadata::PackageInfo;
use options::{configure_options, BuildOptions};
use settings::{validate_min_cppstd, Settings};
use toolchain::{generate_toolchain, ToolchainSettings};

/// A recipe evaluated against concrete settings and options.
#[derive(Debug, Clone)]
pub struct Recipe {
    identity: PackageIdentity,
    version: Option<String>,
    settings: Settings,
    options: BuildOptions,
    layout: BuildLayout,
    package: PackageSection,
}

/// Everything `create` produced.
#[derive(Debug, Clone)]
pub struct PackageArtifact {
    pub package_dir: PathBuf,
    pub archive: PathBuf,
    pub licenses: Vec<String>,
    pub info: PackageInfo,
}

impl Recipe {
    /// Derive identity, validate settings and resolve options.
    ///
    /// Option overrides from `config` apply first, then `option_overrides`.
    /// `version` wins over `[package] version`.
    pub fn evaluate(
        recipe_dir: &Path,
        config: &PackageConfig,
        settings: Settings,
        option_overrides: &[(String, String)],
        version: Option<&str>,
    ) -> Result<Self> {
        let identity = load_identity(recipe_dir)?;
        info!("[recipe] package {identity}");

        validate_min_cppstd(&settings)
            .with_context(|| format!("validating settings for '{identity}'"))?;

        let mut overrides = config.options.overrides();
        overrides.extend_from_slice(option_overrides);
        let options = configure_options(&settings.os, &overrides)
            .with_context(|| format!("configuring options for '{identity}'"))?;

        let layout = BuildLayout::cmake(recipe_dir, &settings.build_type);
        let version = version
            .map(str::to_string)
            .or_else(|| config.package.version.clone());

        Ok(Self {
            identity,
            version,
            settings,
            options,
            layout,
            package: config.package.clone(),
        })
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Toolchain variables this recipe would inject, without writing them.
    pub fn toolchain(&self) -> ToolchainSettings {
        ToolchainSettings::generate(&self.options, self.settings.compiler_cppstd)
    }

    /// Run every writing stage against `cmake`.
    pub fn create(&self, cmake: &dyn ExternalTool) -> Result<PackageArtifact> {
        let _lock = WorkspaceLock::acquire(&self.layout.lock_file())?;
        let name = self.identity.name();

        export::export_sources(
            &self.layout.recipe_dir,
            &self.package.exports_sources(),
            &self.layout.source,
        )
        .with_context(|| format!("exporting sources for '{name}'"))?;

        let toolchain =
            generate_toolchain(&self.layout, &self.options, self.settings.compiler_cppstd)
                .with_context(|| format!("generating toolchain for '{name}'"))?;

        self.build(cmake, &toolchain)
            .with_context(|| format!("building '{name}'"))?;

        let licenses = package::package(cmake, &self.layout)
            .with_context(|| format!("packaging '{name}'"))?;

        let info = metadata::export_metadata(
            &self.layout.package,
            &self.identity,
            self.version(),
            &self.package,
            &self.options,
            &self.settings,
        )
        .with_context(|| format!("exporting metadata for '{name}'"))?;

        let archive = archive::archive_package(
            &self.layout.package,
            &self.layout.root(),
            &self.identity,
            self.version(),
        )?;

        info!("[recipe] {name} packaged at {}", self.layout.package.display());
        Ok(PackageArtifact {
            package_dir: self.layout.package.clone(),
            archive,
            licenses,
            info,
        })
    }

    /// Configure and build the exported sources.
    pub fn build(&self, cmake: &dyn ExternalTool, toolchain: &ToolchainSettings) -> Result<()> {
        let driver = CMake::new(cmake, &self.layout);
        driver.configure(toolchain)?;
        driver.build()
    }
}
