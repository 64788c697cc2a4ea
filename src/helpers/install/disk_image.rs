//! Disk-image installs (MacOS `.dmg` framework bundles)
//!
//! Download the image, mount it at a private temporary mount point, copy
//! `{name}.framework` from the volume root into the vendor directory, then
//! unmount. The image is unmounted even when the copy fails, and deleted
//! afterwards unless it is being kept.

use crate::core::catalog::Dependency;
use crate::core::error::{Result, SetupError};
use crate::core::output;
use crate::helpers::acquire::{Downloader, FallbackDownloader};
use crate::helpers::internal::fs_utils;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use super::{InstallStrategy, confirm_marker};

/// Mounts and unmounts disk images.
pub trait DiskImageTool {
    fn attach(&self, image: &Path, mount_point: &Path) -> Result<()>;
    fn detach(&self, mount_point: &Path) -> Result<()>;
}

/// The host `hdiutil`.
pub struct Hdiutil;

impl Hdiutil {
    fn run(&self, args: &[&OsStr]) -> Result<()> {
        let status = Command::new("hdiutil")
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .stdin(Stdio::null())
            .status()
            .map_err(|e| SetupError::DiskImage(format!("hdiutil failed to start: {}", e)))?;

        if !status.success() {
            let rendered: Vec<String> = args
                .iter()
                .map(|a| a.to_string_lossy().to_string())
                .collect();
            return Err(SetupError::DiskImage(format!(
                "hdiutil {} exited with code {:?}",
                rendered.join(" "),
                status.code()
            )));
        }
        Ok(())
    }
}

impl DiskImageTool for Hdiutil {
    fn attach(&self, image: &Path, mount_point: &Path) -> Result<()> {
        self.run(&[
            OsStr::new("attach"),
            OsStr::new("-nobrowse"),
            OsStr::new("-readonly"),
            OsStr::new("-mountpoint"),
            mount_point.as_os_str(),
            image.as_os_str(),
        ])
    }

    fn detach(&self, mount_point: &Path) -> Result<()> {
        self.run(&[OsStr::new("detach"), mount_point.as_os_str()])
    }
}

pub struct DiskImageInstaller<'a> {
    downloader: &'a dyn Downloader,
    tool: &'a dyn DiskImageTool,
    keep_image: bool,
}

impl<'a> DiskImageInstaller<'a> {
    pub fn new(downloader: &'a dyn Downloader, tool: &'a dyn DiskImageTool, keep_image: bool) -> Self {
        Self {
            downloader,
            tool,
            keep_image,
        }
    }

    /// Copy the bundle through a staging directory next to its final place,
    /// so a failed copy never leaves a partial bundle at the marker path.
    fn copy_bundle(&self, mount_point: &Path, dep: &Dependency) -> Result<u64> {
        let bundle = dep.framework_bundle();
        let source = mount_point.join(&bundle);
        if !source.is_dir() {
            return Err(SetupError::DiskImage(format!(
                "{} not found in mounted image",
                bundle
            )));
        }

        std::fs::create_dir_all(&dep.destination_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".vendor-setup-")
            .tempdir_in(&dep.destination_dir)?;
        let staged = staging.path().join(&bundle);

        let copied = fs_utils::copy_tree(&source, &staged)?;
        std::fs::rename(&staged, dep.destination_dir.join(&bundle))?;
        Ok(copied)
    }

    /// Mount the downloaded image, copy the bundle out and unmount.
    fn copy_from_image(&self, image: &Path, dep: &Dependency) -> Result<u64> {
        let mount = tempfile::Builder::new()
            .prefix("vendor-setup-mount-")
            .tempdir()?;

        output::sub_action("mount");
        output::detail(&format!("{} at {}", image.display(), mount.path().display()));
        self.tool.attach(image, mount.path())?;

        output::sub_action(&format!("copy {}", dep.framework_bundle()));
        let copied = self.copy_bundle(mount.path(), dep);

        output::sub_action("unmount");
        let detached = self.tool.detach(mount.path());

        let files = copied?;
        detached?;
        Ok(files)
    }
}

impl InstallStrategy for DiskImageInstaller<'_> {
    fn install(&self, dep: &Dependency) -> Result<()> {
        let image = dep.artifact_path("dmg");

        output::sub_action("download");
        FallbackDownloader::new(self.downloader).fetch(&dep.sources, &image, dep.sha256.as_deref())?;

        let copied = self.copy_from_image(&image, dep);
        if !self.keep_image {
            match &copied {
                Ok(_) => fs_utils::remove_file_if_exists(&image)?,
                // Report the mount or copy failure, not a cleanup one.
                Err(_) => {
                    fs_utils::remove_file_if_exists(&image).ok();
                }
            }
        }

        let files = copied?;
        output::detail(&format!("{} files copied", files));

        confirm_marker(dep)
    }
}
