//! Pre-flight environment check
//!
//! Runs before the catalog is touched. Verifies the host tools the chosen
//! strategy shells out to, any configured minimum tool versions, and free
//! space at the vendor root.

use crate::core::config::Settings;
use crate::core::error::{Result, SetupError};
use crate::core::output;
use crate::core::platform::{Plan, StrategyKind};
use crate::helpers::install::disk;
use crate::helpers::internal::fs_utils;
use semver::Version;
use std::path::PathBuf;
use std::process::Command;

/// Something that must hold before any dependency work starts.
pub trait EnvironmentCheck {
    fn check(&self) -> Result<()>;
}

/// A host tool that must be on `PATH`, optionally at a minimum version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    pub name: String,
    pub min_version: Option<Version>,
}

impl ToolRequirement {
    pub fn present(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            min_version: None,
        }
    }
}

/// The real host check.
#[derive(Debug, Clone)]
pub struct HostPreflight {
    pub tools: Vec<ToolRequirement>,
    pub vendor_dir: PathBuf,
    pub min_free_bytes: u64,
}

impl HostPreflight {
    /// Requirements for `plan`: the strategy's own tools first, then any
    /// configured ones.
    pub fn for_plan(plan: &Plan, settings: &Settings) -> Self {
        let mut tools = match plan.strategy {
            StrategyKind::Archive => Vec::new(),
            StrategyKind::DiskImage => vec![ToolRequirement::present("hdiutil")],
            StrategyKind::PackageManager => {
                let mut tools = vec![ToolRequirement::present("apt-get")];
                if settings.use_sudo {
                    tools.push(ToolRequirement::present("sudo"));
                }
                tools
            }
        };
        tools.extend(settings.tools.iter().cloned());

        // Linux installs into the system, not the vendor root.
        let min_free_bytes = match plan.strategy {
            StrategyKind::PackageManager => 0,
            _ => settings.min_free_bytes,
        };

        Self {
            tools,
            vendor_dir: settings.vendor_dir.clone(),
            min_free_bytes,
        }
    }
}

impl EnvironmentCheck for HostPreflight {
    fn check(&self) -> Result<()> {
        output::sub_action("checking environment");

        for tool in &self.tools {
            let path = fs_utils::find_in_path(&tool.name).ok_or_else(|| {
                SetupError::EnvironmentPreflight(format!(
                    "required tool '{}' was not found on PATH",
                    tool.name
                ))
            })?;

            match &tool.min_version {
                Some(min) => {
                    let out = Command::new(&path).arg("--version").output().map_err(|e| {
                        SetupError::EnvironmentPreflight(format!(
                            "cannot run '{} --version': {}",
                            tool.name, e
                        ))
                    })?;
                    let text = String::from_utf8_lossy(&out.stdout);
                    let found = check_tool_version(&tool.name, &text, min)?;
                    output::detail(&format!("{} {} detected", tool.name, found));
                }
                None => output::detail(&format!("{} found at {}", tool.name, path.display())),
            }
        }

        if self.min_free_bytes > 0 {
            disk::check_disk_space(&self.vendor_dir, self.min_free_bytes)?;
        }

        Ok(())
    }
}

/// Compare the version reported by a tool against `min`.
pub fn check_tool_version(name: &str, version_output: &str, min: &Version) -> Result<Version> {
    let found = parse_loose_version(version_output).ok_or_else(|| {
        SetupError::EnvironmentPreflight(format!(
            "could not read a version from '{} --version'",
            name
        ))
    })?;

    if found < *min {
        return Err(SetupError::EnvironmentPreflight(format!(
            "{} version too low: found {}, expected {} or higher",
            name, found, min
        )));
    }

    Ok(found)
}

/// Parse the first dotted number in `text` as a version, padding missing
/// components with zero.
///
/// `"cmake version 3.27.4"` -> 3.27.4, `"3.20"` -> 3.20.0
pub fn parse_loose_version(text: &str) -> Option<Version> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let numeric: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut parts = numeric
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>());

    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::platform::{self, Platform};
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_parse_loose_version() {
        assert_eq!(
            parse_loose_version("cmake version 3.27.4\n"),
            Some(Version::new(3, 27, 4))
        );
        assert_eq!(parse_loose_version("3.20"), Some(Version::new(3, 20, 0)));
        assert_eq!(parse_loose_version("apt 2.4.11 (amd64)"), Some(Version::new(2, 4, 11)));
        assert_eq!(parse_loose_version("no digits here"), None);
    }

    #[test]
    fn test_tool_version_too_low() {
        let min = Version::new(3, 20, 0);
        let err = check_tool_version("cmake", "cmake version 3.16.3", &min).unwrap_err();
        assert!(err.to_string().contains("version too low"));
        assert!(check_tool_version("cmake", "cmake version 3.28.1", &min).is_ok());
    }

    #[test]
    fn test_missing_tool_fails() {
        let check = HostPreflight {
            tools: vec![ToolRequirement::present("definitely-not-a-real-tool-4821")],
            vendor_dir: PathBuf::from("."),
            min_free_bytes: 0,
        };
        let err = check.check().unwrap_err();
        assert!(matches!(err, SetupError::EnvironmentPreflight(_)));
        assert!(err.to_string().contains("definitely-not-a-real-tool-4821"));
    }

    #[test]
    fn test_no_requirements_passes() {
        let temp = tempdir().unwrap();
        let check = HostPreflight {
            tools: Vec::new(),
            vendor_dir: temp.path().to_path_buf(),
            min_free_bytes: 1,
        };
        assert!(check.check().is_ok());
    }

    #[test]
    fn test_for_plan_adds_strategy_tools() {
        let catalog = Catalog::pinned(Path::new("/vendor"));
        let settings = Settings::default();

        let mac = platform::resolve(Platform::MacOS, &catalog).unwrap();
        let names: Vec<_> = HostPreflight::for_plan(&mac, &settings)
            .tools
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["hdiutil"]);

        let linux = platform::resolve(Platform::Linux, &catalog).unwrap();
        let check = HostPreflight::for_plan(&linux, &settings);
        let names: Vec<_> = check.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["apt-get", "sudo"]);
        assert_eq!(check.min_free_bytes, 0);

        let windows = platform::resolve(Platform::Windows, &catalog).unwrap();
        assert!(HostPreflight::for_plan(&windows, &settings).tools.is_empty());
    }
}
