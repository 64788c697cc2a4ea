//! Dependency acquisition run
//!
//! The run flow:
//! 1. pre-flight environment check (fatal on failure)
//! 2. per dependency: marker present? skip
//! 3. otherwise ask consent, then install with the platform strategy
//! 4. the overall result is the AND of every dependency's outcome
//!
//! On Linux the group is installed by one package-manager command behind a
//! single consent question; denying it or a failing command aborts the run.

use super::catalog::{Catalog, Dependency, InstallState};
use super::consent::{ConsentProvider, download_prompt};
use super::error::{Result, SetupError};
use super::output;
use super::platform::{self, Plan, Platform, StrategyKind};
use super::preflight::EnvironmentCheck;
use crate::helpers::acquire::Downloader;
use crate::helpers::install::{
    ArchiveInstaller, DiskImageInstaller, DiskImageTool, InstallStrategy, PackageManager,
};

/// The collaborators a run talks to.
pub struct Toolkit<'a> {
    pub consent: &'a dyn ConsentProvider,
    pub preflight: &'a dyn EnvironmentCheck,
    pub downloader: &'a dyn Downloader,
    pub disk_images: &'a dyn DiskImageTool,
    pub package_manager: &'a dyn PackageManager,
    /// Keep downloaded archives and disk images after installing.
    pub keep_archives: bool,
}

/// How one dependency ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Marker already existed; nothing was done.
    Present,
    Installed,
    ConsentDenied,
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Present | Self::Installed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
    pub name: String,
    pub version: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub platform: Platform,
    pub dependencies: Vec<DependencyReport>,
}

impl RunReport {
    /// True when every dependency is present or was installed.
    pub fn success(&self) -> bool {
        self.dependencies.iter().all(|d| d.outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DependencyReport> {
        self.dependencies.iter().filter(|d| !d.outcome.is_success())
    }
}

pub struct Orchestrator<'a> {
    toolkit: Toolkit<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(toolkit: Toolkit<'a>) -> Self {
        Self { toolkit }
    }

    /// Bring every dependency in `plan` onto disk.
    ///
    /// Errors returned here abort the whole run: pre-flight failure, a
    /// consent prompt that cannot be answered, and on Linux a declined or
    /// failed package-manager step. Per-dependency failures on the other
    /// platforms are recorded in the report instead.
    pub fn run(&self, plan: &Plan) -> Result<RunReport> {
        output::action(&format!(
            "Preparing {} dependencies for {}",
            plan.dependencies.len(),
            plan.platform
        ));

        self.toolkit.preflight.check()?;

        let dependencies = match plan.strategy {
            StrategyKind::Archive => {
                let installer =
                    ArchiveInstaller::new(self.toolkit.downloader, self.toolkit.keep_archives);
                self.install_each(plan, &installer)?
            }
            StrategyKind::DiskImage => {
                let installer = DiskImageInstaller::new(
                    self.toolkit.downloader,
                    self.toolkit.disk_images,
                    self.toolkit.keep_archives,
                );
                self.install_each(plan, &installer)?
            }
            StrategyKind::PackageManager => self.install_bundled(plan)?,
        };

        let report = RunReport {
            platform: plan.platform,
            dependencies,
        };
        print_summary(&report);
        Ok(report)
    }

    fn install_each(
        &self,
        plan: &Plan,
        strategy: &dyn InstallStrategy,
    ) -> Result<Vec<DependencyReport>> {
        let total = plan.dependencies.len();
        let mut reports = Vec::with_capacity(total);

        for (i, dep) in plan.dependencies.iter().enumerate() {
            output::action_numbered(i + 1, total, &dep.label());

            let outcome = match dep.state() {
                InstallState::Present => {
                    output::skip(&format!("{} already installed, skipping", dep.label()));
                    Outcome::Present
                }
                InstallState::Missing => {
                    let prompt = download_prompt(&dep.name, &dep.version);
                    if !self.toolkit.consent.confirm(&prompt)? {
                        output::warning(&format!("{} not installed (declined)", dep.label()));
                        Outcome::ConsentDenied
                    } else {
                        match strategy.install(dep) {
                            Ok(()) => {
                                output::success(&format!("{} installed", dep.label()));
                                Outcome::Installed
                            }
                            Err(e) => {
                                output::error(&format!("{}: {}", dep.label(), e));
                                Outcome::Failed(e.to_string())
                            }
                        }
                    }
                }
            };

            reports.push(report_for(dep, outcome));
        }

        Ok(reports)
    }

    fn install_bundled(&self, plan: &Plan) -> Result<Vec<DependencyReport>> {
        let missing: Vec<&Dependency> = plan
            .dependencies
            .iter()
            .filter(|d| d.state() == InstallState::Missing)
            .collect();

        if missing.is_empty() {
            output::skip("all system packages already installed, skipping");
            return Ok(plan
                .dependencies
                .iter()
                .map(|d| report_for(d, Outcome::Present))
                .collect());
        }

        let names: Vec<&str> = missing.iter().map(|d| d.name.as_str()).collect();
        let packages = plan.system_packages();
        let manager = self.toolkit.package_manager;
        let prompt = format!(
            "{} not found. Would you like to install {} system packages with {}?",
            names.join(", "),
            packages.len(),
            manager.name()
        );

        if !self.toolkit.consent.confirm(&prompt)? {
            return Err(SetupError::ConsentDenied(format!(
                "system packages for {} are required",
                names.join(", ")
            )));
        }

        output::sub_action(&format!("{} install", manager.name()));
        manager.install(&packages)?;

        let reports = plan
            .dependencies
            .iter()
            .map(|dep| {
                let outcome = if !missing.iter().any(|m| m.name == dep.name) {
                    Outcome::Present
                } else if dep.state() == InstallState::Present {
                    Outcome::Installed
                } else {
                    let e = SetupError::MarkerMissing {
                        name: dep.name.clone(),
                        marker: dep.marker_path.clone(),
                    };
                    output::error(&e.to_string());
                    Outcome::Failed(e.to_string())
                };
                report_for(dep, outcome)
            })
            .collect();

        Ok(reports)
    }
}

/// Resolve `platform` against `catalog` and run the plan.
///
/// `Unsupported` fails before any collaborator is called.
pub fn prepare(platform: Platform, catalog: &Catalog, toolkit: Toolkit<'_>) -> Result<RunReport> {
    let plan = platform::resolve(platform, catalog)?;
    Orchestrator::new(toolkit).run(&plan)
}

/// Marker state of every dependency in `plan`, without side effects.
pub fn status(plan: &Plan) -> Vec<(&Dependency, InstallState)> {
    plan.dependencies.iter().map(|d| (d, d.state())).collect()
}

fn report_for(dep: &Dependency, outcome: Outcome) -> DependencyReport {
    DependencyReport {
        name: dep.name.clone(),
        version: dep.version.clone(),
        outcome,
    }
}

fn print_summary(report: &RunReport) {
    let total = report.dependencies.len();
    let failed: Vec<String> = report
        .failed()
        .map(|d| format!("{} {}", d.name, d.version))
        .collect();

    if failed.is_empty() {
        output::success(&format!("all {} dependencies ready", total));
    } else {
        output::error(&format!(
            "{} of {} dependencies not installed: {}",
            failed.len(),
            total,
            failed.join(", ")
        ));
    }
}
