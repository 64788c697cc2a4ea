//! Host platform detection and strategy selection.

use crate::core::catalog::{Catalog, Dependency};
use crate::core::error::{Result, SetupError};
use std::fmt;

/// The closed set of hosts vendor-setup knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Windows,
    MacOS,
    Unsupported,
}

impl Platform {
    /// Platform of the running host.
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a platform identifier to a variant.
    ///
    /// Accepts Rust's `std::env::consts::OS` names as well as the
    /// `sys.platform`-style aliases (`linux2`, `win32`, `darwin`).
    pub fn from_os(os: &str) -> Self {
        match os.trim().to_ascii_lowercase().as_str() {
            "linux" | "linux2" => Self::Linux,
            "windows" | "win32" => Self::Windows,
            "macos" | "darwin" => Self::MacOS,
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::MacOS => "macos",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How missing dependencies get installed on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Download a `.zip` and extract it (Windows).
    Archive,
    /// Download a `.dmg`, mount it, copy a framework bundle out (MacOS).
    DiskImage,
    /// One package-manager command for the whole group (Linux).
    PackageManager,
}

/// Everything the orchestrator needs to know about the resolved host.
#[derive(Debug, Clone)]
pub struct Plan {
    pub platform: Platform,
    pub strategy: StrategyKind,
    pub dependencies: Vec<Dependency>,
}

impl Plan {
    /// Package names for the bundled package-manager install, in catalog
    /// order with duplicates removed.
    pub fn system_packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for dep in &self.dependencies {
            for pkg in dep.sources.iter() {
                if !packages.iter().any(|p| p == pkg) {
                    packages.push(pkg.to_string());
                }
            }
        }
        packages
    }
}

/// Resolve a platform against the catalog.
///
/// `Unsupported` fails immediately, before anything is read or written.
pub fn resolve(platform: Platform, catalog: &Catalog) -> Result<Plan> {
    let strategy = match platform {
        Platform::Linux => StrategyKind::PackageManager,
        Platform::Windows => StrategyKind::Archive,
        Platform::MacOS => StrategyKind::DiskImage,
        Platform::Unsupported => {
            return Err(SetupError::UnsupportedPlatform(format!(
                "cannot install dependencies on '{}'; supported hosts are linux, windows and macos",
                std::env::consts::OS
            )));
        }
    };

    Ok(Plan {
        platform,
        strategy,
        dependencies: catalog.for_platform(platform).into_iter().cloned().collect(),
    })
}
