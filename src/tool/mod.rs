//! External tool capability interface.
//!
//! Every program the pipelines drive (cmake, lcov, genhtml) is reached through
//! [`ExternalTool`], so orchestration code never spawns processes directly and
//! can be exercised against [`fake::FakeTool`] in tests.
//!
//! Binary resolution order for [`SystemTool::resolve`]:
//! 1. `<NAME>_BIN` env var (e.g. `LCOV_BIN`)
//! 2. Program configured in `package.toml` `[tools]`
//! 3. Default program name, looked up in `PATH`

pub mod cmake;
#[cfg(test)]
pub(crate) mod fake;

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::{InvocationFailure, ToolInvocationError, ToolUnavailableError};

/// A program the pipelines can probe and run.
pub trait ExternalTool {
    /// Short name used in log lines and errors.
    fn name(&self) -> &str;

    /// Whether the program is present and answers a version query.
    fn probe(&self) -> bool;

    /// Run the program to completion and return its exit code.
    ///
    /// `Err` means the process could not be started at all. A process killed by
    /// a signal reports `-1`.
    fn run(&self, args: &[String]) -> std::io::Result<i32>;
}

/// An [`ExternalTool`] backed by a real executable.
#[derive(Debug, Clone)]
pub struct SystemTool {
    name: String,
    program: PathBuf,
}

impl SystemTool {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }

    /// Resolve the program for `name`, honouring `<NAME>_BIN` and a configured
    /// override before falling back to `name` itself.
    pub fn resolve(name: &str, configured: Option<&str>) -> Self {
        let env_key = format!("{}_BIN", name.to_ascii_uppercase());
        let program = env::var(&env_key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| configured.map(str::to_string))
            .unwrap_or_else(|| name.to_string());
        Self::new(name, program)
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

impl ExternalTool for SystemTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self) -> bool {
        // A program missing from PATH and one that errors on --version are
        // both unavailable.
        let Ok(path) = which::which(&self.program) else {
            debug!("{} not found in PATH", self.program.display());
            return false;
        };

        Command::new(&path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, args: &[String]) -> std::io::Result<i32> {
        debug!("running {} {}", self.program.display(), args.join(" "));
        let status = Command::new(&self.program)
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Fail with [`ToolUnavailableError`] unless every tool answers its probe.
pub fn require_available(tools: &[&dyn ExternalTool]) -> Result<()> {
    for tool in tools {
        if !tool.probe() {
            return Err(ToolUnavailableError {
                tool: tool.name().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Run `tool` and turn a spawn failure or non-zero exit into
/// [`ToolInvocationError`].
pub fn run_checked(tool: &dyn ExternalTool, args: &[String]) -> Result<()> {
    let failure = match tool.run(args) {
        Ok(0) => return Ok(()),
        Ok(code) => InvocationFailure::Exit(code),
        Err(err) => InvocationFailure::Spawn(err),
    };

    Err(ToolInvocationError {
        tool: tool.name().to_string(),
        args: args.join(" "),
        failure,
    }
    .into())
}

/// Build an owned argument vector from string-like parts.
pub fn args<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
