//! Build settings (os, compiler, C++ standard, build type, arch) and the
//! minimum C++ standard check.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{SettingsError, UnsupportedStandardError};

/// Oldest standard the library builds with.
pub const MIN_CPPSTD: CppStd = CppStd {
    year: 17,
    gnu: false,
};

/// Target operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Os {
    Linux,
    Windows,
    WindowsStore,
    WindowsCE,
    Macos,
    Other(String),
}

impl Os {
    /// The OS this binary was compiled for.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            "macos" => Os::Macos,
            other => Os::Other(other.to_string()),
        }
    }

    pub fn is_windows_family(&self) -> bool {
        matches!(self, Os::Windows | Os::WindowsStore | Os::WindowsCE)
    }
}

impl FromStr for Os {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Linux" | "linux" => Os::Linux,
            "Windows" | "windows" => Os::Windows,
            "WindowsStore" => Os::WindowsStore,
            "WindowsCE" => Os::WindowsCE,
            "Macos" | "macos" | "Darwin" => Os::Macos,
            other => Os::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Linux => f.write_str("Linux"),
            Os::Windows => f.write_str("Windows"),
            Os::WindowsStore => f.write_str("WindowsStore"),
            Os::WindowsCE => f.write_str("WindowsCE"),
            Os::Macos => f.write_str("Macos"),
            Os::Other(name) => f.write_str(name),
        }
    }
}

/// A `compiler.cppstd` value such as `17` or `gnu20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CppStd {
    /// Two-digit codified year: 98, 11, 14, 17, 20, 23.
    year: u8,
    gnu: bool,
}

impl CppStd {
    /// Chronological key; `98` precedes `11`.
    fn chronological(self) -> u16 {
        if self.year >= 98 {
            1900 + u16::from(self.year)
        } else {
            2000 + u16::from(self.year)
        }
    }

    /// Standard number as CMake expects it in `CMAKE_CXX_STANDARD`.
    pub fn year(self) -> u8 {
        self.year
    }

    pub fn is_gnu(self) -> bool {
        self.gnu
    }
}

impl PartialOrd for CppStd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CppStd {
    // GNU extensions do not change the standard level.
    fn cmp(&self, other: &Self) -> Ordering {
        self.chronological()
            .cmp(&other.chronological())
            .then(self.gnu.cmp(&other.gnu))
    }
}

impl FromStr for CppStd {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (gnu, digits) = match raw.strip_prefix("gnu") {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        match digits {
            "98" | "11" | "14" | "17" | "20" | "23" => Ok(CppStd {
                year: digits
                    .parse()
                    .map_err(|_| SettingsError::InvalidCppStd(raw.to_string()))?,
                gnu,
            }),
            _ => Err(SettingsError::InvalidCppStd(raw.to_string())),
        }
    }
}

impl fmt::Display for CppStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gnu {
            write!(f, "gnu{:02}", self.year)
        } else {
            write!(f, "{:02}", self.year)
        }
    }
}

/// Settings a recipe is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub os: Os,
    pub compiler: Option<String>,
    pub compiler_cppstd: Option<CppStd>,
    pub build_type: String,
    pub arch: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            os: Os::host(),
            compiler: None,
            compiler_cppstd: None,
            build_type: "Release".to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

impl Settings {
    /// Apply one `key=value` override, as passed with `-s`.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key.trim() {
            "os" => self.os = value.parse().unwrap_or(Os::Other(value.to_string())),
            "compiler" => self.compiler = Some(value.trim().to_string()),
            "compiler.cppstd" | "cppstd" => self.compiler_cppstd = Some(value.parse()?),
            "build_type" => self.build_type = value.trim().to_string(),
            "arch" => self.arch = value.trim().to_string(),
            other => return Err(SettingsError::Unknown(other.to_string())),
        }
        Ok(())
    }
}

/// Require the declared standard to be at least [`MIN_CPPSTD`].
///
/// An undeclared standard passes.
pub fn validate_min_cppstd(settings: &Settings) -> Result<(), UnsupportedStandardError> {
    match settings.compiler_cppstd {
        Some(declared) if declared < MIN_CPPSTD => Err(UnsupportedStandardError {
            declared: declared.to_string(),
            minimum: MIN_CPPSTD.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Split a `KEY=VALUE` override.
pub fn split_override(raw: &str) -> Result<(&str, &str), SettingsError> {
    raw.split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| SettingsError::Malformed(raw.to_string()))
}
