//! Per-platform install strategies
//!
//! - **archive**: download a `.zip` through the fallback chain and extract it
//! - **disk_image**: download a `.dmg`, mount it, copy the framework out
//! - **package_manager**: one system package-manager command for the group
//! - **disk**: free space checks used by the pre-flight

pub mod archive;
pub mod disk;
pub mod disk_image;
pub mod package_manager;

use crate::core::catalog::{Dependency, InstallState};
use crate::core::error::{Result, SetupError};

pub use archive::ArchiveInstaller;
pub use disk::check_disk_space;
pub use disk_image::{DiskImageInstaller, DiskImageTool, Hdiutil};
pub use package_manager::{Apt, PackageManager};

/// Installs one missing dependency.
pub trait InstallStrategy {
    fn install(&self, dep: &Dependency) -> Result<()>;
}

/// Re-check the marker after an install step claimed success.
pub fn confirm_marker(dep: &Dependency) -> Result<()> {
    match dep.state() {
        InstallState::Present => Ok(()),
        InstallState::Missing => Err(SetupError::MarkerMissing {
            name: dep.name.clone(),
            marker: dep.marker_path.clone(),
        }),
    }
}
