//! Pinned dependency table
//!
//! Every SDK the downstream build needs, per platform, with its marker path
//! and an ordered list of sources. The first source is the authoritative
//! release location; later ones are mirrors.
//!
//! Keep these versions consistent with the build's CMake find modules.

use crate::core::error::{Result, SetupError};
use crate::core::platform::Platform;
use std::path::{Path, PathBuf};

pub const SDL2_VERSION: &str = "2.26.5";
pub const SDL2_IMAGE_VERSION: &str = "2.6.3";
pub const SDL2_TTF_VERSION: &str = "2.20.2";
pub const SDL2_MIXER_VERSION: &str = "2.6.3";

/// Where the system package manager puts SDL2 headers on Debian-like hosts.
const SYSTEM_SDL2_INCLUDE: &str = "/usr/include/SDL2";

/// An ordered, non-empty list of candidate locations for one artifact.
///
/// On archive platforms these are URLs; on Linux they are the OS package
/// names that provide the dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceList(Vec<String>);

impl SourceList {
    /// Build from a list of locations. Returns `None` if the list is empty.
    pub fn new<I, S>(sources: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            None
        } else {
            Some(Self(sources))
        }
    }

    pub fn single(source: impl Into<String>) -> Self {
        Self(vec![source.into()])
    }

    /// A primary location followed by mirrors, tried in order.
    pub fn with_mirrors<I, S>(primary: impl Into<String>, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sources = vec![primary.into()];
        sources.extend(mirrors.into_iter().map(Into::into));
        Self(sources)
    }

    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Derived install state. Never stored; the filesystem is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Present,
    Missing,
}

/// One third-party SDK on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub platform: Platform,
    pub sources: SourceList,
    /// Directory the artifact is downloaded to and installed into.
    pub destination_dir: PathBuf,
    /// File or bundle whose existence proves the dependency is installed.
    pub marker_path: PathBuf,
    /// Expected SHA-256 of the downloaded artifact, if pinned.
    pub sha256: Option<String>,
}

impl Dependency {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        platform: Platform,
        sources: SourceList,
        destination_dir: impl Into<PathBuf>,
        marker_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            platform,
            sources,
            destination_dir: destination_dir.into(),
            marker_path: marker_path.into(),
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    pub fn state(&self) -> InstallState {
        if self.marker_path.exists() {
            InstallState::Present
        } else {
            InstallState::Missing
        }
    }

    /// `{name} {version}`, for messages.
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.version)
    }

    /// Local path the downloaded artifact is written to.
    ///
    /// Example: `{vendor}/SDL2-2.26.5.zip`
    pub fn artifact_path(&self, extension: &str) -> PathBuf {
        self.destination_dir
            .join(format!("{}-{}.{}", self.name, self.version, extension))
    }

    /// Name of the framework bundle shipped inside a MacOS disk image.
    pub fn framework_bundle(&self) -> String {
        format!("{}.framework", self.name)
    }
}

/// The static dependency table.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Dependency>,
}

impl Catalog {
    /// Build a catalog, rejecting two active entries with the same name on
    /// the same platform.
    pub fn new(entries: Vec<Dependency>) -> Result<Self> {
        for (i, dep) in entries.iter().enumerate() {
            let duplicate = entries[..i]
                .iter()
                .any(|other| other.platform == dep.platform && other.name == dep.name);
            if duplicate {
                return Err(SetupError::Config(format!(
                    "duplicate catalog entry for {} on {}",
                    dep.name, dep.platform
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The pinned SDL2 table rooted at `vendor_dir`.
    pub fn pinned(vendor_dir: &Path) -> Self {
        let mut entries = Vec::new();
        for sdk in SDKS {
            entries.push(sdk.windows(vendor_dir));
            entries.push(sdk.macos(vendor_dir));
            entries.push(sdk.linux());
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[Dependency] {
        &self.entries
    }

    /// Entries active on `platform`, in catalog order.
    pub fn for_platform(&self, platform: Platform) -> Vec<&Dependency> {
        self.entries
            .iter()
            .filter(|d| d.platform == platform)
            .collect()
    }
}

/// Static description of one SDL library, expanded per platform.
struct Sdk {
    name: &'static str,
    version: &'static str,
    /// GitHub repository under libsdl-org.
    repo: &'static str,
    header: &'static str,
    /// Mirror directory on libsdl.org.
    mirror: &'static str,
    packages: &'static [&'static str],
}

const SDKS: &[Sdk] = &[
    Sdk {
        name: "SDL2",
        version: SDL2_VERSION,
        repo: "SDL",
        header: "SDL.h",
        mirror: "https://www.libsdl.org/release",
        packages: &["libsdl2-dev", "libsdl2-2.0-0"],
    },
    Sdk {
        name: "SDL2_image",
        version: SDL2_IMAGE_VERSION,
        repo: "SDL_image",
        header: "SDL_image.h",
        mirror: "https://www.libsdl.org/projects/SDL_image/release",
        packages: &[
            "libjpeg-dev",
            "libwebp-dev",
            "libtiff5-dev",
            "libsdl2-image-dev",
            "libsdl2-image-2.0-0",
        ],
    },
    Sdk {
        name: "SDL2_ttf",
        version: SDL2_TTF_VERSION,
        repo: "SDL_ttf",
        header: "SDL_ttf.h",
        mirror: "https://www.libsdl.org/projects/SDL_ttf/release",
        packages: &["libfreetype6-dev", "libsdl2-ttf-dev", "libsdl2-ttf-2.0-0"],
    },
    Sdk {
        name: "SDL2_mixer",
        version: SDL2_MIXER_VERSION,
        repo: "SDL_mixer",
        header: "SDL_mixer.h",
        mirror: "https://www.libsdl.org/projects/SDL_mixer/release",
        packages: &[
            "libmikmod-dev",
            "libfishsound1-dev",
            "libsmpeg-dev",
            "liboggz2-dev",
            "libflac-dev",
            "libfluidsynth-dev",
            "libsdl2-mixer-dev",
            "libsdl2-mixer-2.0-0",
        ],
    },
];

impl Sdk {
    fn release_url(&self, asset: &str) -> String {
        format!(
            "https://github.com/libsdl-org/{}/releases/download/release-{}/{}",
            self.repo, self.version, asset
        )
    }

    fn sources_for(&self, asset: &str) -> SourceList {
        SourceList::with_mirrors(
            self.release_url(asset),
            [format!("{}/{}", self.mirror, asset)],
        )
    }

    fn windows(&self, vendor_dir: &Path) -> Dependency {
        let asset = format!("{}-devel-{}-VC.zip", self.name, self.version);
        let marker = vendor_dir
            .join(format!("{}-{}", self.name, self.version))
            .join("include")
            .join(self.header);
        Dependency::new(
            self.name,
            self.version,
            Platform::Windows,
            self.sources_for(&asset),
            vendor_dir,
            marker,
        )
    }

    fn macos(&self, vendor_dir: &Path) -> Dependency {
        let asset = format!("{}-{}.dmg", self.name, self.version);
        let marker = vendor_dir.join(format!("{}.framework", self.name));
        Dependency::new(
            self.name,
            self.version,
            Platform::MacOS,
            self.sources_for(&asset),
            vendor_dir,
            marker,
        )
    }

    fn linux(&self) -> Dependency {
        let packages = SourceList(self.packages.iter().map(|p| p.to_string()).collect());
        Dependency::new(
            self.name,
            self.version,
            Platform::Linux,
            packages,
            SYSTEM_SDL2_INCLUDE,
            Path::new(SYSTEM_SDL2_INCLUDE).join(self.header),
        )
    }
}
