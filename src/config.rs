//! Optional `package.toml` beside the build descriptor.
//!
//! Every section and field is optional; an absent file behaves like an empty
//! one. Unknown fields are rejected.
//!
//! ```toml
//! [package]
//! version = "0.3.1"
//! license = "Apache 2.0"
//! topics = ["lwm2m", "technology-adapter"]
//! requires = ["gtest/[~1.11]"]
//! default_user = "Hahn-Schickard"
//! exports_sources = ["cmake*", "includes*", "sources*", "CMakeLists.txt"]
//!
//! [settings]
//! os = "Linux"
//! compiler = "gcc"
//! cppstd = "17"
//! build_type = "Release"
//!
//! [options]
//! shared = true
//!
//! [tools]
//! cmake = "/opt/cmake/bin/cmake"
//!
//! [coverage]
//! ignore_file = "utility/Coverage_Ignores.txt"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::recipe::export::DEFAULT_EXPORTS_SOURCES;
use crate::recipe::settings::Settings;

/// Config file name looked up in the recipe directory.
pub const CONFIG_FILENAME: &str = "package.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    #[serde(default)]
    pub package: PackageSection,
    #[serde(default)]
    pub settings: SettingsSection,
    #[serde(default)]
    pub options: OptionsSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub coverage: CoverageSection,
}

/// Descriptive package fields recorded in the exported metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
    pub version: Option<String>,
    pub license: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Declared requirements; recorded, never resolved.
    #[serde(default)]
    pub requires: Vec<String>,
    pub default_user: Option<String>,
    pub exports_sources: Option<Vec<String>>,
}

impl PackageSection {
    pub fn exports_sources(&self) -> Vec<String> {
        self.exports_sources.clone().unwrap_or_else(|| {
            DEFAULT_EXPORTS_SOURCES
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsSection {
    pub os: Option<String>,
    pub compiler: Option<String>,
    pub cppstd: Option<String>,
    pub build_type: Option<String>,
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsSection {
    pub shared: Option<bool>,
    #[serde(rename = "fPIC")]
    pub fpic: Option<bool>,
}

impl OptionsSection {
    /// Configured options as `(name, value)` overrides.
    pub fn overrides(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(shared) = self.shared {
            out.push(("shared".to_string(), shared.to_string()));
        }
        if let Some(fpic) = self.fpic {
            out.push(("fPIC".to_string(), fpic.to_string()));
        }
        out
    }
}

/// Program names or paths for the external tools.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    pub cmake: Option<String>,
    pub lcov: Option<String>,
    pub genhtml: Option<String>,
}

/// Coverage pipeline paths, relative to the coverage root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverageSection {
    pub build_dir: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub trace_file: Option<PathBuf>,
    pub ignore_file: Option<PathBuf>,
}

impl PackageConfig {
    /// Load `path`, or the default config if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading package config '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing package config '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Settings from the `[settings]` section on top of host defaults.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();
        let section = &self.settings;
        let pairs = [
            ("os", section.os.as_deref()),
            ("compiler", section.compiler.as_deref()),
            ("compiler.cppstd", section.cppstd.as_deref()),
            ("build_type", section.build_type.as_deref()),
            ("arch", section.arch.as_deref()),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                settings
                    .apply(key, value)
                    .with_context(|| format!("invalid [settings] {key}"))?;
            }
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::settings::Os;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = PackageConfig::load(&temp.path().join(CONFIG_FILENAME)).unwrap();
        assert!(config.package.requires.is_empty());
        assert_eq!(config.package.exports_sources().len(), 4);
    }

    #[test]
    fn test_parse_full_config() {
        let config = PackageConfig::parse(
            r#"
[package]
version = "0.3.1"
license = "Apache 2.0"
requires = ["gtest/[~1.11]", "variant_visitor/0.1.2@hahn-schickard/stable"]

[settings]
os = "Windows"
cppstd = "20"

[options]
shared = false

[tools]
lcov = "/usr/local/bin/lcov"

[coverage]
ignore_file = "utility/Coverage_Ignores.txt"
"#,
        )
        .unwrap();

        assert_eq!(config.package.version.as_deref(), Some("0.3.1"));
        assert_eq!(config.package.requires.len(), 2);
        assert_eq!(config.tools.lcov.as_deref(), Some("/usr/local/bin/lcov"));
        assert_eq!(
            config.options.overrides(),
            vec![("shared".to_string(), "false".to_string())]
        );

        let settings = config.settings().unwrap();
        assert_eq!(settings.os, Os::Windows);
        assert_eq!(settings.compiler_cppstd.unwrap().year(), 20);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(PackageConfig::parse("[package]\nname = \"x\"\n").is_err());
        assert!(PackageConfig::parse("[unknown]\n").is_err());
    }

    #[test]
    fn test_invalid_cppstd_in_settings() {
        let config = PackageConfig::parse("[settings]\ncppstd = \"16\"\n").unwrap();
        assert!(config.settings().is_err());
    }
}
