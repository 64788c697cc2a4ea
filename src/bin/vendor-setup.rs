//! vendor-setup CLI - fetch the pinned SDKs before a native build
//!
//! Usage:
//!   vendor-setup                   Install whatever is missing
//!   vendor-setup status            Show which dependencies are present

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use vendor_setup::{
    AlwaysNo, AlwaysYes, Apt, Catalog, ConsentMode, ConsentProvider, Hdiutil, HostPreflight,
    HttpDownloader, InstallState, Orchestrator, Plan, Platform, PromptConsent, Settings, Toolkit,
    config, output, platform, status,
};

#[derive(Parser)]
#[command(name = "vendor-setup")]
#[command(about = "Download and install the third-party SDKs the native build needs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file to use instead of ./vendor-setup.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vendor directory for downloaded SDKs
    #[arg(long, global = true)]
    vendor_dir: Option<PathBuf>,

    /// Override host detection (linux, windows, macos)
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Answer yes to every prompt
    #[arg(short = 'y', long, conflicts_with = "no")]
    yes: bool,

    /// Answer no to every prompt
    #[arg(long)]
    no: bool,

    /// Keep downloaded archives and disk images
    #[arg(long)]
    keep_archives: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which dependencies are present, without changing anything
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let settings = settings_for(&cli)?;

    let host = match &cli.platform {
        Some(name) => Platform::from_os(name),
        None => Platform::detect(),
    };
    let catalog = Catalog::pinned(&settings.vendor_dir);
    let plan = platform::resolve(host, &catalog)?;

    match cli.command {
        Some(Commands::Status) => {
            print_status(&plan);
            Ok(true)
        }
        None => install(&plan, &settings),
    }
}

/// Config files and environment, then command-line flags on top.
fn settings_for(cli: &Cli) -> Result<Settings> {
    let mut settings =
        config::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Some(dir) = &cli.vendor_dir {
        settings.vendor_dir = dir.clone();
    }
    if cli.yes {
        settings.consent = ConsentMode::Yes;
    } else if cli.no {
        settings.consent = ConsentMode::No;
    }
    if cli.keep_archives {
        settings.keep_archives = true;
    }

    Ok(settings)
}

fn install(plan: &Plan, settings: &Settings) -> Result<bool> {
    output::info(&format!("vendor directory: {}", settings.vendor_dir.display()));

    let consent: Box<dyn ConsentProvider> = match settings.consent {
        ConsentMode::Ask => Box::new(PromptConsent::terminal()),
        ConsentMode::Yes => Box::new(AlwaysYes),
        ConsentMode::No => Box::new(AlwaysNo),
    };
    let preflight = HostPreflight::for_plan(plan, settings);
    let downloader = HttpDownloader::new(&settings.http);
    let apt = Apt::new(settings.use_sudo);

    let orchestrator = Orchestrator::new(Toolkit {
        consent: consent.as_ref(),
        preflight: &preflight,
        downloader: &downloader,
        disk_images: &Hdiutil,
        package_manager: &apt,
        keep_archives: settings.keep_archives,
    });

    let report = orchestrator
        .run(plan)
        .with_context(|| format!("setup for {} failed", plan.platform))?;

    Ok(report.success())
}

fn print_status(plan: &Plan) {
    output::action(&format!("Dependencies for {}", plan.platform));
    for (dep, state) in status(plan) {
        let installed = state == InstallState::Present;
        let note = if installed {
            format!("{} (installed)", dep.version)
        } else {
            format!("{} (missing: {})", dep.version, dep.marker_path.display())
        };
        output::list_item(&dep.name, &note, installed);
    }
}
