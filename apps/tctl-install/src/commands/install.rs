//! Install mode for the tctl-install CLI.
//!
//! Resolves the artifact for the current platform and installs it, or with
//! `--dry-run` prints what would be installed and exits.
//!
//! ## Usage
//!
//! ```bash
//! tctl-install                              # Install 1.12.5 to /usr/local/bin
//! tctl-install --version 1.12.4 --dir ~/bin # Install a specific version elsewhere
//! tctl-install --dry-run                    # Show URL and destination only
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use inquire::Confirm;

use crate::config::InstallerConfig;
use crate::errors::InstallerError;
use crate::fetch::ToolFetcher;
use crate::installer::{InstallOutcome, InstallPlan, InstallRequest, Installer};
use crate::output;
use crate::platform::PlatformId;
use crate::shell::{Shell, dir_in_path, path_guidance};
use crate::verify::Verification;

/// Arguments for install mode.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Version of tctl to install [default: 1.12.5].
    #[clap(short = 'v', long = "version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Directory to install tctl into [default: /usr/local/bin].
    #[clap(short = 'd', long = "dir", value_name = "DIRECTORY")]
    pub dir: Option<PathBuf>,

    /// Print the download URL and install path without downloading.
    #[clap(long = "dry-run", action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Skip the confirmation prompt shown on Windows.
    #[clap(short = 'y', long = "yes", action = clap::ArgAction::SetTrue)]
    pub yes: bool,
}

/// Executes install mode.
///
/// # Process
///
/// 1. Detect the current platform
/// 2. Build the install request from flags and defaults
/// 3. With `--dry-run`, print the plan and stop
/// 4. On Windows, ask for confirmation unless `--yes`
/// 5. Locate `curl` or `wget`
/// 6. Run the installer and report the result
///
/// # Errors
///
/// Returns an error if:
/// - The platform is not supported
/// - No download tool is installed
/// - The download fails (after restoring any previous binary)
/// - The user declines the confirmation prompt
pub fn execute(args: &InstallArgs, config: &InstallerConfig, json: bool) -> Result<()> {
    let platform = PlatformId::detect()?;
    let request = InstallRequest::new(
        config,
        args.version.clone(),
        args.dir.clone(),
        platform,
        args.dry_run,
    );

    if request.dry_run {
        return print_plan(&request.plan(config), json);
    }

    if platform.is_windows() && !args.yes {
        confirm(&request, config)?;
    }

    let fetcher = ToolFetcher::locate()?;
    output::step(&format!("Using {} for download", fetcher.tool()));
    let outcome = Installer::new(config, fetcher).install(&request)?;
    report(&outcome, &request, config);

    Ok(())
}

/// Prints the resolved plan for `--dry-run`.
fn print_plan(plan: &InstallPlan, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }

    println!("Dry run: nothing will be downloaded or written.");
    println!();
    println!("  Platform: {}", plan.platform);
    println!("  Version:  {}", plan.version);
    println!("  URL:      {}", plan.url);
    println!("  Path:     {}", plan.path.display());
    Ok(())
}

/// Asks the user to confirm a Windows install.
fn confirm(request: &InstallRequest, config: &InstallerConfig) -> Result<()> {
    let proceed = Confirm::new(&format!(
        "Install {} {} to {}?",
        config.binary_name,
        request.version,
        request.install_dir.display()
    ))
    .with_default(false)
    .prompt()
    .context("Failed to read confirmation")?;

    if proceed {
        Ok(())
    } else {
        Err(InstallerError::Cancelled.into())
    }
}

/// Prints the success message, version banner, and PATH guidance.
fn report(outcome: &InstallOutcome, request: &InstallRequest, config: &InstallerConfig) {
    log::info!(
        "installed {} ({:?} privilege) via stages {:?}",
        outcome.path.display(),
        outcome.privilege,
        outcome.stages
    );

    println!();
    output::success(&format!(
        "{} {} installed to {}",
        config.binary_name,
        request.version,
        outcome.path.display()
    ));

    if let Verification::Confirmed { output } = &outcome.verification
        && !output.is_empty()
    {
        println!();
        println!("{output}");
    }

    let path_var = std::env::var_os("PATH");
    if !dir_in_path(&request.install_dir, path_var.as_deref()) {
        println!();
        let home = dirs::home_dir();
        for line in path_guidance(&request.install_dir, Shell::detect(), home.as_deref()) {
            println!("{line}");
        }
    }
}
