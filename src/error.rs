//! Typed failure kinds raised by the recipe engine and coverage pipeline.
//!
//! Library functions return `anyhow::Result` and wrap these values, so callers
//! can recover the kind with `downcast_ref` when they need to branch on it.

use std::path::PathBuf;
use thiserror::Error;

/// The package name marker in the build descriptor is missing or unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no `set(THIS <name>)` marker found in {}", .path.display())]
    Missing { path: PathBuf },

    #[error("`set(THIS ...)` marker on line {line} of {} has an empty name", .path.display())]
    Empty { path: PathBuf, line: usize },

    #[error(
        "`set(THIS ...)` marker appears {count} times in {} (lines {lines:?}); exactly one is required",
        .path.display()
    )]
    Ambiguous {
        path: PathBuf,
        count: usize,
        lines: Vec<usize>,
    },
}

/// The declared C++ standard is older than the recipe supports.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("compiler.cppstd={declared} is not supported; {minimum} or newer is required")]
pub struct UnsupportedStandardError {
    pub declared: String,
    pub minimum: String,
}

/// Invalid option requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("option '{name}' is not available on {os}")]
    Unsupported { name: String, os: String },

    #[error("unknown option '{0}'; expected 'shared' or 'fPIC'")]
    Unknown(String),

    #[error("invalid value '{value}' for option '{name}'; expected True or False")]
    InvalidValue { name: String, value: String },
}

/// Invalid setting overrides.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting '{0}'; expected os, compiler, compiler.cppstd, build_type or arch")]
    Unknown(String),

    #[error("invalid compiler.cppstd '{0}'; expected one of 98, 11, 14, 17, 20, 23 (optionally gnu-prefixed)")]
    InvalidCppStd(String),

    #[error("malformed override '{0}'; expected KEY=VALUE")]
    Malformed(String),
}

/// An external tool could not be found or failed its version probe.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("program '{tool}' is not installed or not usable")]
pub struct ToolUnavailableError {
    pub tool: String,
}

/// How an external tool invocation went wrong.
#[derive(Debug)]
pub enum InvocationFailure {
    Spawn(std::io::Error),
    Exit(i32),
}

/// An external tool could not be spawned or exited non-zero.
#[derive(Debug, Error)]
#[error("{tool} {args} {}", describe(.failure))]
pub struct ToolInvocationError {
    pub tool: String,
    pub args: String,
    pub failure: InvocationFailure,
}

fn describe(failure: &InvocationFailure) -> String {
    match failure {
        InvocationFailure::Spawn(err) => format!("could not be started: {err}"),
        InvocationFailure::Exit(code) => format!("failed with exit code: {code}"),
    }
}
