//! Archive-based installs (Windows `.zip` SDK bundles).

use crate::core::catalog::Dependency;
use crate::core::error::Result;
use crate::core::output;
use crate::helpers::acquire::{Downloader, FallbackDownloader};
use crate::helpers::build::ArchiveExtractor;

use super::{InstallStrategy, confirm_marker};

pub struct ArchiveInstaller<'a> {
    downloader: &'a dyn Downloader,
    extractor: ArchiveExtractor,
}

impl<'a> ArchiveInstaller<'a> {
    pub fn new(downloader: &'a dyn Downloader, keep_archive: bool) -> Self {
        Self {
            downloader,
            extractor: ArchiveExtractor::new(keep_archive),
        }
    }
}

impl InstallStrategy for ArchiveInstaller<'_> {
    fn install(&self, dep: &Dependency) -> Result<()> {
        let archive = dep.artifact_path("zip");

        output::sub_action("download");
        FallbackDownloader::new(self.downloader).fetch(
            &dep.sources,
            &archive,
            dep.sha256.as_deref(),
        )?;

        output::sub_action("extract");
        let report = self.extractor.extract(&archive, &dep.destination_dir)?;
        output::detail(&format!(
            "{} written, {} already present",
            report.written, report.skipped
        ));

        confirm_marker(dep)
    }
}
