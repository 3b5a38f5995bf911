//! Coverage pipeline: lcov capture, pattern filtering and an HTML report.
//!
//! Steps, all fatal on failure:
//!
//! 1. probe `lcov` and `genhtml`
//! 2. reset: recreate `code_coverage_report/`, delete `code_coverage.info`
//! 3. capture counters from `build/` into the tracefile
//! 4. `lcov --remove` once per ignore pattern, in file order
//! 5. `lcov --list`, then `genhtml` into the report folder
//!
//! Each filter narrows the tracefile left by the previous one.

pub mod ignores;
pub mod tracefile;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::CoverageSection;
use crate::filesystem::{recreate_dir, remove_file_if_exists};
use crate::lock::WorkspaceLock;
use crate::tool::{args, require_available, run_checked, ExternalTool};

use ignores::{load_ignore_patterns, IGNORE_FILENAME};
use tracefile::Tracefile;

pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_REPORT_DIR: &str = "code_coverage_report";
pub const DEFAULT_TRACE_FILE: &str = "code_coverage.info";
const LOCK_FILENAME: &str = ".code_coverage.lock";

/// Resolved paths for one coverage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageConfig {
    pub root: PathBuf,
    pub build_dir: PathBuf,
    pub report_dir: PathBuf,
    pub trace_file: PathBuf,
    pub ignore_file: PathBuf,
}

impl CoverageConfig {
    /// Default layout under `root`; the ignore file lives in `utility/`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            build_dir: root.join(DEFAULT_BUILD_DIR),
            report_dir: root.join(DEFAULT_REPORT_DIR),
            trace_file: root.join(DEFAULT_TRACE_FILE),
            ignore_file: root.join("utility").join(IGNORE_FILENAME),
        }
    }

    /// Apply `[coverage]` entries, resolved against `root`.
    pub fn from_section(root: &Path, section: &CoverageSection) -> Self {
        let mut config = Self::new(root);
        if let Some(dir) = &section.build_dir {
            config.build_dir = root.join(dir);
        }
        if let Some(dir) = &section.report_dir {
            config.report_dir = root.join(dir);
        }
        if let Some(file) = &section.trace_file {
            config.trace_file = root.join(file);
        }
        if let Some(file) = &section.ignore_file {
            config.ignore_file = root.join(file);
        }
        config
    }

    /// Command-line overrides, resolved against `root` like the config entries.
    pub fn with_overrides(mut self, build_dir: Option<&Path>, ignore_file: Option<&Path>) -> Self {
        if let Some(dir) = build_dir {
            self.build_dir = self.root.join(dir);
        }
        if let Some(file) = ignore_file {
            self.ignore_file = self.root.join(file);
        }
        self
    }

    fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILENAME)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    pub trace_file: PathBuf,
    pub report_dir: PathBuf,
    pub patterns: Vec<String>,
    pub source_files: usize,
    pub digest: String,
}

pub struct CoveragePipeline<'a> {
    lcov: &'a dyn ExternalTool,
    genhtml: &'a dyn ExternalTool,
    config: CoverageConfig,
}

impl<'a> CoveragePipeline<'a> {
    pub fn new(
        lcov: &'a dyn ExternalTool,
        genhtml: &'a dyn ExternalTool,
        config: CoverageConfig,
    ) -> Self {
        Self {
            lcov,
            genhtml,
            config,
        }
    }

    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    pub fn run(&self) -> Result<CoverageReport> {
        require_available(&[self.lcov, self.genhtml])?;
        let _lock = WorkspaceLock::acquire(&self.config.lock_file())?;

        self.reset()?;
        self.capture()?;

        let patterns = load_ignore_patterns(&self.config.ignore_file)?;
        for pattern in &patterns {
            self.remove(pattern)?;
        }

        let trace = path_arg(&self.config.trace_file);
        run_checked(self.lcov, &args(["--list", trace.as_str()]))?;
        self.render()?;

        let filtered = Tracefile::load(&self.config.trace_file)?;
        let mut source_files = 0;
        for source in filtered.source_files() {
            debug!("covered {source}");
            source_files += 1;
        }
        let report = CoverageReport {
            trace_file: self.config.trace_file.clone(),
            report_dir: self.config.report_dir.clone(),
            patterns,
            source_files,
            digest: filtered.digest(),
        };
        info!(
            "[coverage] {} source files remain, trace sha256 {}",
            report.source_files, report.digest
        );
        Ok(report)
    }

    fn reset(&self) -> Result<()> {
        recreate_dir(&self.config.report_dir)?;
        remove_file_if_exists(&self.config.trace_file)
    }

    fn capture(&self) -> Result<()> {
        info!("[coverage] capturing {}", self.config.build_dir.display());
        let build = dir_arg(&self.config.build_dir);
        let trace = path_arg(&self.config.trace_file);
        run_checked(
            self.lcov,
            &args([
                "--directory",
                build.as_str(),
                "--capture",
                "--output-file",
                trace.as_str(),
                "-rc",
                "lcov_branch_coverage=1",
            ]),
        )
    }

    fn remove(&self, pattern: &str) -> Result<()> {
        info!("[coverage] ignoring files matching '{pattern}'");
        let trace = path_arg(&self.config.trace_file);
        run_checked(
            self.lcov,
            &args(["--remove", trace.as_str(), pattern, "-o", trace.as_str()]),
        )
    }

    fn render(&self) -> Result<()> {
        info!("[coverage] rendering {}", self.config.report_dir.display());
        let trace = path_arg(&self.config.trace_file);
        let report = dir_arg(&self.config.report_dir);
        run_checked(
            self.genhtml,
            &args([
                trace.as_str(),
                "--branch-coverage",
                "--output-directory",
                report.as_str(),
            ]),
        )
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Directory argument with a trailing slash, as lcov and genhtml are given.
fn dir_arg(path: &Path) -> String {
    let mut arg = path_arg(path);
    if !arg.ends_with('/') {
        arg.push('/');
    }
    arg
}
