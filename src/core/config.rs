//! Layered settings
//!
//! Later layers win:
//! 1. compiled-in defaults
//! 2. `$XDG_CONFIG_HOME/vendor-setup/config.toml`
//! 3. `./vendor-setup.toml` (or the file passed with `--config`)
//! 4. `VENDOR_SETUP_*` environment variables
//! 5. command-line flags (applied by the binary)
//!
//! The dependency table itself is compiled in; settings only steer where and
//! how it gets installed.
//!
//! ```toml
//! vendor_dir = "external"
//! consent = "ask"          # ask | yes | no
//! keep_archives = false
//! min_free_mb = 256
//!
//! [http]
//! connect_timeout_secs = 30
//! read_timeout_secs = 60
//!
//! [package_manager]
//! sudo = true
//!
//! [[preflight.tools]]
//! name = "cmake"
//! min_version = "3.20"
//! ```

use crate::core::consent::ConsentMode;
use crate::core::error::{Result, SetupError};
use crate::core::preflight::{ToolRequirement, parse_loose_version};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser user-agent sent with every download; some hosts reject default
/// client identifiers.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36";

const DEFAULT_VENDOR_DIR: &str = "external";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MIN_FREE_MB: u64 = 256;
const PROJECT_CONFIG_FILE: &str = "vendor-setup.toml";

/// Timeouts are clamped to this range (seconds).
const TIMEOUT_RANGE: (u64, u64) = (5, 300);

/// HTTP client settings for one source attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            user_agent: BROWSER_USER_AGENT.to_owned(),
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub vendor_dir: PathBuf,
    pub http: HttpSettings,
    pub consent: ConsentMode,
    pub keep_archives: bool,
    pub min_free_bytes: u64,
    pub use_sudo: bool,
    pub tools: Vec<ToolRequirement>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vendor_dir: PathBuf::from(DEFAULT_VENDOR_DIR),
            http: HttpSettings::default(),
            consent: ConsentMode::Ask,
            keep_archives: false,
            min_free_bytes: DEFAULT_MIN_FREE_MB * 1024 * 1024,
            use_sudo: true,
            tools: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    vendor_dir: Option<PathBuf>,
    consent: Option<String>,
    keep_archives: Option<bool>,
    min_free_mb: Option<u64>,
    http: Option<HttpToml>,
    package_manager: Option<PackageManagerToml>,
    preflight: Option<PreflightToml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HttpToml {
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PackageManagerToml {
    sudo: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PreflightToml {
    tools: Option<Vec<ToolToml>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolToml {
    name: String,
    min_version: Option<String>,
}

impl SettingsToml {
    fn merge(&mut self, other: SettingsToml) {
        if other.vendor_dir.is_some() {
            self.vendor_dir = other.vendor_dir;
        }
        if other.consent.is_some() {
            self.consent = other.consent;
        }
        if other.keep_archives.is_some() {
            self.keep_archives = other.keep_archives;
        }
        if other.min_free_mb.is_some() {
            self.min_free_mb = other.min_free_mb;
        }
        match (self.http.as_mut(), other.http) {
            (Some(dst), Some(src)) => dst.merge(src),
            (None, Some(src)) => self.http = Some(src),
            _ => {}
        }
        if let Some(src) = other.package_manager
            && src.sudo.is_some()
        {
            self.package_manager = Some(src);
        }
        if let Some(src) = other.preflight
            && src.tools.is_some()
        {
            self.preflight = Some(src);
        }
    }

    /// Apply `VENDOR_SETUP_*` overrides from `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("VENDOR_SETUP_DIR").filter(|s| !s.trim().is_empty()) {
            self.vendor_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(secs) = lookup("VENDOR_SETUP_HTTP_TIMEOUT").and_then(|s| s.trim().parse().ok())
        {
            self.http.get_or_insert_with(HttpToml::default).read_timeout_secs = Some(secs);
        }
        if let Some(mode) = lookup("VENDOR_SETUP_ASSUME").filter(|s| !s.trim().is_empty()) {
            self.consent = Some(mode);
        }
    }

    fn resolve(self) -> Result<Settings> {
        let defaults = Settings::default();
        let http = self.http.unwrap_or_default();

        let consent = match self.consent.as_deref() {
            Some(raw) => ConsentMode::parse(raw).map_err(SetupError::Config)?,
            None => defaults.consent,
        };

        let min_free_bytes = match self.min_free_mb {
            Some(mb) => mb.checked_mul(1024 * 1024).ok_or_else(|| {
                SetupError::Config(format!("min_free_mb {} is too large", mb))
            })?,
            None => defaults.min_free_bytes,
        };

        let mut tools = Vec::new();
        for tool in self.preflight.and_then(|p| p.tools).unwrap_or_default() {
            let min_version = match tool.min_version.as_deref() {
                Some(raw) => Some(parse_loose_version(raw).ok_or_else(|| {
                    SetupError::Config(format!(
                        "invalid min_version '{}' for tool '{}'",
                        raw, tool.name
                    ))
                })?),
                None => None,
            };
            tools.push(ToolRequirement {
                name: tool.name,
                min_version,
            });
        }

        Ok(Settings {
            vendor_dir: self.vendor_dir.unwrap_or(defaults.vendor_dir),
            http: HttpSettings {
                connect_timeout: clamp_timeout(
                    http.connect_timeout_secs
                        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
                ),
                read_timeout: clamp_timeout(
                    http.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
                ),
                user_agent: http.user_agent.unwrap_or(defaults.http.user_agent),
            },
            consent,
            keep_archives: self.keep_archives.unwrap_or(defaults.keep_archives),
            min_free_bytes,
            use_sudo: self
                .package_manager
                .and_then(|p| p.sudo)
                .unwrap_or(defaults.use_sudo),
            tools,
        })
    }
}

impl HttpToml {
    fn merge(&mut self, other: HttpToml) {
        if other.connect_timeout_secs.is_some() {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        if other.read_timeout_secs.is_some() {
            self.read_timeout_secs = other.read_timeout_secs;
        }
        if other.user_agent.is_some() {
            self.user_agent = other.user_agent;
        }
    }
}

fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(TIMEOUT_RANGE.0, TIMEOUT_RANGE.1))
}

fn xdg_config_home() -> PathBuf {
    if let Ok(raw) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

fn read_toml(path: &Path) -> Result<SettingsToml> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SetupError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    toml::from_str::<SettingsToml>(&text)
        .map_err(|e| SetupError::Config(format!("invalid TOML in {}: {}", path.display(), e)))
}

/// Candidate config files, lowest precedence first.
fn find_config_files(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![xdg_config_home().join("vendor-setup").join("config.toml")];
    match explicit {
        Some(path) => paths.push(path.to_path_buf()),
        None => paths.push(PathBuf::from(PROJECT_CONFIG_FILE)),
    }
    paths
}

fn load_layers(
    files: &[PathBuf],
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    if let Some(path) = explicit
        && !path.exists()
    {
        return Err(SetupError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let mut merged = SettingsToml::default();
    for path in files {
        if path.exists() {
            merged.merge(read_toml(path)?);
        }
    }
    merged.apply_env(lookup);
    merged.resolve()
}

/// Load settings from config files and the environment.
///
/// `explicit` replaces the project file; it must exist.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let files = find_config_files(explicit);
    load_layers(&files, explicit, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_files() {
        let settings = load_layers(&[], None, no_env).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.vendor_dir, PathBuf::from("external"));
        assert_eq!(settings.http.user_agent, BROWSER_USER_AGENT);
    }

    #[test]
    fn test_later_file_wins() {
        let temp = tempdir().unwrap();
        let user = temp.path().join("user.toml");
        let project = temp.path().join("project.toml");
        std::fs::write(
            &user,
            "vendor_dir = \"/opt/vendor\"\nkeep_archives = true\n[http]\nread_timeout_secs = 120\n",
        )
        .unwrap();
        std::fs::write(&project, "vendor_dir = \"third_party\"\n[http]\nconnect_timeout_secs = 10\n")
            .unwrap();

        let settings = load_layers(&[user, project], None, no_env).unwrap();
        assert_eq!(settings.vendor_dir, PathBuf::from("third_party"));
        assert!(settings.keep_archives);
        assert_eq!(settings.http.read_timeout, Duration::from_secs(120));
        assert_eq!(settings.http.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_env_overrides_files() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project.toml");
        std::fs::write(&project, "consent = \"no\"\n").unwrap();

        let env: HashMap<&str, &str> = [
            ("VENDOR_SETUP_ASSUME", "yes"),
            ("VENDOR_SETUP_HTTP_TIMEOUT", "45"),
            ("VENDOR_SETUP_DIR", "deps"),
        ]
        .into_iter()
        .collect();
        let settings = load_layers(&[project], None, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.consent, ConsentMode::Yes);
        assert_eq!(settings.http.read_timeout, Duration::from_secs(45));
        assert_eq!(settings.vendor_dir, PathBuf::from("deps"));
    }

    #[test]
    fn test_timeouts_clamped() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project.toml");
        std::fs::write(
            &project,
            "[http]\nconnect_timeout_secs = 1\nread_timeout_secs = 100000\n",
        )
        .unwrap();

        let settings = load_layers(&[project], None, no_env).unwrap();
        assert_eq!(settings.http.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.http.read_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_invalid_consent_is_config_error() {
        let env = |k: &str| (k == "VENDOR_SETUP_ASSUME").then(|| "maybe".to_string());
        let err = load_layers(&[], None, env).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
    }

    #[test]
    fn test_huge_min_free_mb_is_config_error() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project.toml");
        std::fs::write(&project, "min_free_mb = 9223372036854775807\n").unwrap();

        let err = load_layers(&[project], None, no_env).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
        assert!(err.to_string().contains("min_free_mb"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project.toml");
        std::fs::write(&project, "vendor_directory = \"x\"\n").unwrap();

        let err = load_layers(&[project], None, no_env).unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_preflight_tools_parsed() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project.toml");
        std::fs::write(
            &project,
            "min_free_mb = 10\n[package_manager]\nsudo = false\n[[preflight.tools]]\nname = \"cmake\"\nmin_version = \"3.20\"\n",
        )
        .unwrap();

        let settings = load_layers(&[project], None, no_env).unwrap();
        assert_eq!(settings.min_free_bytes, 10 * 1024 * 1024);
        assert!(!settings.use_sudo);
        assert_eq!(settings.tools.len(), 1);
        assert_eq!(settings.tools[0].name, "cmake");
        assert_eq!(
            settings.tools[0].min_version,
            Some(semver::Version::new(3, 20, 0))
        );
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope.toml");
        let files = find_config_files(Some(&missing));
        let err = load_layers(&files, Some(&missing), no_env).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
