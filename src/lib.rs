//! Pre-build SDK acquisition
//!
//! Makes sure a fixed set of third-party SDKs (SDL2 and its companion
//! libraries) is on disk before a native build runs. For the running host it
//! picks the pinned catalog entries, skips every dependency whose marker file
//! already exists, asks before installing anything, and then:
//!
//! - **Windows**: downloads the `.zip` devel bundle, falling back across
//!   mirrors, and extracts it into the vendor directory
//! - **MacOS**: downloads the `.dmg`, mounts it, copies the framework out
//! - **Linux**: installs the system packages with one `apt-get` command
//!
//! # Example
//!
//! ```no_run
//! use vendor_setup::{AlwaysYes, Apt, Catalog, Hdiutil, HostPreflight, HttpDownloader};
//! use vendor_setup::{Platform, Settings, Toolkit, platform, prepare};
//!
//! let settings = Settings::default();
//! let catalog = Catalog::pinned(&settings.vendor_dir);
//! let plan = platform::resolve(Platform::detect(), &catalog)?;
//! let preflight = HostPreflight::for_plan(&plan, &settings);
//! let downloader = HttpDownloader::new(&settings.http);
//! let apt = Apt::new(settings.use_sudo);
//!
//! let report = prepare(
//!     plan.platform,
//!     &catalog,
//!     Toolkit {
//!         consent: &AlwaysYes,
//!         preflight: &preflight,
//!         downloader: &downloader,
//!         disk_images: &Hdiutil,
//!         package_manager: &apt,
//!         keep_archives: settings.keep_archives,
//!     },
//! )?;
//! assert!(report.success());
//! # Ok::<(), vendor_setup::SetupError>(())
//! ```

pub mod core;
pub mod helpers;

pub use crate::core::catalog::{Catalog, Dependency, InstallState, SourceList};
pub use crate::core::config::{self, HttpSettings, Settings};
pub use crate::core::consent::{AlwaysNo, AlwaysYes, ConsentMode, ConsentProvider, PromptConsent};
pub use crate::core::error::{Result, SetupError};
pub use crate::core::orchestrator::{
    DependencyReport, Orchestrator, Outcome, RunReport, Toolkit, prepare, status,
};
pub use crate::core::output;
pub use crate::core::platform::{self, Plan, Platform, StrategyKind};
pub use crate::core::preflight::{EnvironmentCheck, HostPreflight, ToolRequirement};
pub use crate::helpers::acquire::{Downloader, FallbackDownloader, HttpDownloader};
pub use crate::helpers::build::{ArchiveExtractor, ExtractReport};
pub use crate::helpers::install::{
    Apt, ArchiveInstaller, DiskImageInstaller, DiskImageTool, Hdiutil, InstallStrategy,
    PackageManager,
};
