//! Package options: `shared` and `fPIC`.
//!
//! Both default to enabled. On Windows-family targets `fPIC` does not exist:
//! it is removed from the option set rather than set to false, and asking for
//! it there is an error.

use crate::error::OptionError;
use crate::recipe::settings::Os;

/// Resolved option values for one recipe evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub shared: bool,
    /// `None` when the target platform has no such option.
    pub fpic: Option<bool>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            shared: true,
            fpic: Some(true),
        }
    }
}

impl BuildOptions {
    /// Option names and values in declaration order, skipping removed ones.
    pub fn entries(&self) -> Vec<(&'static str, bool)> {
        let mut entries = vec![("shared", self.shared)];
        if let Some(fpic) = self.fpic {
            entries.push(("fPIC", fpic));
        }
        entries
    }
}

/// Resolve options for `os`, then apply `overrides` (`name`, `value`) in order.
pub fn configure_options(os: &Os, overrides: &[(String, String)]) -> Result<BuildOptions, OptionError> {
    let mut options = BuildOptions::default();
    if os.is_windows_family() {
        options.fpic = None;
    }

    for (name, value) in overrides {
        let name = name.trim();
        match name {
            "shared" => options.shared = parse_bool(name, value)?,
            "fPIC" => {
                if options.fpic.is_none() {
                    return Err(OptionError::Unsupported {
                        name: name.to_string(),
                        os: os.to_string(),
                    });
                }
                options.fpic = Some(parse_bool(name, value)?);
            }
            other => return Err(OptionError::Unknown(other.to_string())),
        }
    }

    Ok(options)
}

fn parse_bool(name: &str, value: &str) -> Result<bool, OptionError> {
    match value.trim() {
        "True" | "true" | "1" | "ON" | "on" => Ok(true),
        "False" | "false" | "0" | "OFF" | "off" => Ok(false),
        other => Err(OptionError::InvalidValue {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_defaults_on_linux() {
        let options = configure_options(&Os::Linux, &[]).unwrap();
        assert!(options.shared);
        assert_eq!(options.fpic, Some(true));
        assert_eq!(options.entries(), vec![("shared", true), ("fPIC", true)]);
    }

    #[test]
    fn test_fpic_removed_on_windows() {
        for os in [Os::Windows, Os::WindowsStore, Os::WindowsCE] {
            let options = configure_options(&os, &[]).unwrap();
            assert_eq!(options.fpic, None);
            assert_eq!(options.entries(), vec![("shared", true)]);
        }
    }

    #[test]
    fn test_fpic_request_on_windows_is_unsupported() {
        let err = configure_options(&Os::Windows, &[set("fPIC", "False")]).unwrap_err();
        assert_eq!(
            err,
            OptionError::Unsupported {
                name: "fPIC".to_string(),
                os: "Windows".to_string()
            }
        );
    }

    #[test]
    fn test_overrides_apply() {
        let options =
            configure_options(&Os::Macos, &[set("shared", "False"), set("fPIC", "OFF")]).unwrap();
        assert!(!options.shared);
        assert_eq!(options.fpic, Some(false));
    }

    #[test]
    fn test_unknown_option_and_bad_value() {
        assert_eq!(
            configure_options(&Os::Linux, &[set("header_only", "True")]).unwrap_err(),
            OptionError::Unknown("header_only".to_string())
        );
        assert!(matches!(
            configure_options(&Os::Linux, &[set("shared", "maybe")]).unwrap_err(),
            OptionError::InvalidValue { .. }
        ));
    }
}
