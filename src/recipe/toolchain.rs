//! Toolchain generation: the CMake variables injected before configure.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use tracing::info;

use crate::recipe::layout::BuildLayout;
use crate::recipe::options::BuildOptions;
use crate::recipe::settings::CppStd;

/// CMake variables and cache variables, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainSettings {
    variables: Vec<(String, String)>,
    cache_variables: Vec<(String, String)>,
}

impl ToolchainSettings {
    /// The fixed variable set plus option- and standard-derived values.
    pub fn generate(options: &BuildOptions, cppstd: Option<CppStd>) -> Self {
        let mut tc = Self::default();
        tc.set("STATIC_CODE_ANALYSIS", cmake_bool(false));
        tc.set("RUN_TESTS", cmake_bool(false));
        tc.set("USE_CONAN", cmake_bool(true));
        tc.set_cache("CMAKE_POLICY_DEFAULT_CMP0077", "NEW");

        tc.set("BUILD_SHARED_LIBS", cmake_bool(options.shared));
        if let Some(fpic) = options.fpic {
            tc.set("CMAKE_POSITION_INDEPENDENT_CODE", cmake_bool(fpic));
        }
        if let Some(std) = cppstd {
            tc.set("CMAKE_CXX_STANDARD", std.year().to_string());
            tc.set("CMAKE_CXX_EXTENSIONS", cmake_bool(std.is_gnu()));
        }
        tc
    }

    /// Set a variable, replacing an earlier value for the same key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        upsert(&mut self.variables, key, value.into());
    }

    pub fn set_cache(&mut self, key: &str, value: impl Into<String>) {
        upsert(&mut self.cache_variables, key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables
            .iter()
            .chain(self.cache_variables.iter())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn cache_variables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cache_variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as a CMake toolchain file.
    pub fn render(&self) -> String {
        let mut out = String::from("# Generated by package-builder. Do not edit.\n\n");
        for (key, value) in self.variables() {
            let _ = writeln!(out, "set({key} {value})");
        }
        for (key, value) in self.cache_variables() {
            let _ = writeln!(out, "set({key} \"{value}\" CACHE STRING \"\" FORCE)");
        }
        out
    }
}

/// Generate the toolchain and write it to the layout's generators folder.
pub fn generate_toolchain(
    layout: &BuildLayout,
    options: &BuildOptions,
    cppstd: Option<CppStd>,
) -> Result<ToolchainSettings> {
    let tc = ToolchainSettings::generate(options, cppstd);

    fs::create_dir_all(&layout.generators).with_context(|| {
        format!(
            "creating generators directory '{}'",
            layout.generators.display()
        )
    })?;
    let path = layout.toolchain_file();
    fs::write(&path, tc.render())
        .with_context(|| format!("writing toolchain file '{}'", path.display()))?;

    info!("[toolchain] wrote {}", path.display());
    Ok(tc)
}

fn upsert(entries: &mut Vec<(String, String)>, key: &str, value: String) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key.to_string(), value)),
    }
}

fn cmake_bool(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}
