#![warn(clippy::pedantic)]

//! # tctl installer (tctl-install)
//!
//! Detects the host OS and CPU architecture, downloads the matching `tctl`
//! release binary, installs it into a directory, and checks that it runs.
//!
//! ## Modes
//!
//! - `--help` - Print usage
//! - `--list-versions` - Print the known release list
//! - `--dry-run` - Print the download URL and install path only
//! - default - Install
//!
//! `--help` and `--list-versions` are mutually exclusive: whichever comes
//! first on the command line wins, and everything after it is ignored.
//!
//! ## Examples
//!
//! Install the default version to `/usr/local/bin`:
//! ```bash
//! tctl-install
//! ```
//!
//! Install a specific version into a user directory:
//! ```bash
//! tctl-install --version 1.12.4 --dir ~/.local/bin
//! ```
//!
//! Upgrading over an existing `tctl` moves it to `tctl.backup` first and
//! restores it if the download fails.

mod commands;
mod config;
mod errors;
mod fetch;
mod installer;
mod output;
mod platform;
mod privilege;
mod shell;
mod verify;

use std::ffi::{OsStr, OsString};

use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use commands::{install, versions};
use config::InstallerConfig;
use errors::InstallerError;

/// Installer for the tctl command-line tool.
#[derive(Parser)]
#[command(
    name = "tctl-install",
    about = "Download and install the tctl command-line tool",
    long_about = "Detects the current OS and architecture, downloads the matching tctl \
    binary, installs it into a directory, and verifies that it runs.",
    disable_version_flag = true,
    group(ArgGroup::new("json_output").args(["list_versions", "dry_run"]).multiple(true)),
    after_help = "\
ENVIRONMENT VARIABLES:
    TCTL_DOWNLOAD_HOST      Artifact host (default: binaries.dl.tetrate.io)
    NO_COLOR                Disable coloured output
    RUST_LOG                Log filter (default: warn)"
)]
pub struct Cli {
    /// List known tctl versions and exit.
    #[clap(long = "list-versions", action = clap::ArgAction::SetTrue)]
    pub list_versions: bool,

    /// Print machine-readable JSON (with --list-versions or --dry-run).
    #[clap(long = "json", action = clap::ArgAction::SetTrue, requires = "json_output")]
    pub json: bool,

    #[command(flatten)]
    pub install: install::InstallArgs,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = InstallerConfig::from_env();
    output::init_color(config.color);

    if let Err(e) = run(&config) {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Handles an error and returns the appropriate exit code.
///
/// A declined confirmation is not a failure and exits with 0. Everything
/// else prints the error chain and exits with 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(InstallerError::Cancelled) = e.downcast_ref::<InstallerError>() {
        println!("Installation cancelled.");
        return 0;
    }
    eprintln!("Error: {e:#}");
    1
}

fn run(config: &InstallerConfig) -> Result<()> {
    let args: Vec<OsString> = std::env::args_os().collect();

    match leading_mode(args.iter().skip(1).map(OsString::as_os_str)) {
        Some(LeadingMode::ShortHelp) => {
            Cli::command().print_help()?;
            return Ok(());
        }
        Some(LeadingMode::LongHelp) => {
            Cli::command().print_long_help()?;
            return Ok(());
        }
        Some(LeadingMode::ListVersions { json }) => return versions::execute(config, json),
        None => {}
    }

    let cli = Cli::parse_from(args);
    if cli.list_versions {
        return versions::execute(config, cli.json);
    }

    install::execute(&cli.install, config, cli.json)
}

/// Informational modes that end the run before install flags are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeadingMode {
    ShortHelp,
    LongHelp,
    ListVersions { json: bool },
}

/// Finds the first `-h`, `--help` or `--list-versions` in argument order.
///
/// Scanning stops at the first argument that is not a known install flag,
/// so clap reports it as a usage error. Option values are skipped unless
/// they look like flags themselves, matching how clap consumes them.
fn leading_mode<'a>(args: impl IntoIterator<Item = &'a OsStr>) -> Option<LeadingMode> {
    let mut args = args.into_iter().peekable();
    let mut json = false;

    while let Some(arg) = args.next() {
        let arg = arg.to_str()?;
        match arg {
            "-h" => return Some(LeadingMode::ShortHelp),
            "--help" => return Some(LeadingMode::LongHelp),
            "--list-versions" => {
                json |= args.any(|rest| rest == "--json");
                return Some(LeadingMode::ListVersions { json });
            }
            "--json" => json = true,
            "--dry-run" | "-y" | "--yes" => {}
            "-v" | "--version" | "-d" | "--dir" => {
                if args
                    .peek()
                    .is_some_and(|value| !value.to_string_lossy().starts_with('-'))
                {
                    args.next();
                }
            }
            _ if arg.starts_with("--version=") || arg.starts_with("--dir=") => {}
            _ if (arg.starts_with("-v") || arg.starts_with("-d")) && arg.len() > 2 => {}
            _ => return None,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_of(args: &[&str]) -> Option<LeadingMode> {
        leading_mode(args.iter().map(OsStr::new))
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_flags_uses_defaults() {
        let cli = Cli::try_parse_from(["tctl-install"]).unwrap();
        assert!(!cli.list_versions);
        assert!(!cli.install.dry_run);
        assert!(cli.install.version.is_none());
        assert!(cli.install.dir.is_none());
    }

    #[test]
    fn short_and_long_flags_parse() {
        let cli = Cli::try_parse_from(["tctl-install", "-v", "9.9.9", "-d", "/tmp/x", "--dry-run"])
            .unwrap();
        assert_eq!(cli.install.version.as_deref(), Some("9.9.9"));
        assert_eq!(cli.install.dir, Some(std::path::PathBuf::from("/tmp/x")));
        assert!(cli.install.dry_run);

        let cli = Cli::try_parse_from(["tctl-install", "--version", "1.0.0", "--dir", "/opt"])
            .unwrap();
        assert_eq!(cli.install.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Cli::try_parse_from(["tctl-install", "--frobnicate"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn cancelled_exits_zero() {
        let err = anyhow::Error::from(InstallerError::Cancelled);
        assert_eq!(handle_error(&err), 0);
    }

    #[test]
    fn other_errors_exit_one() {
        let err = anyhow::Error::from(InstallerError::NoDownloadTool);
        assert_eq!(handle_error(&err), 1);
    }

    #[test]
    fn first_informational_flag_wins() {
        assert_eq!(
            mode_of(&["--list-versions", "--help"]),
            Some(LeadingMode::ListVersions { json: false })
        );
        assert_eq!(mode_of(&["--help", "--list-versions"]), Some(LeadingMode::LongHelp));
        assert_eq!(mode_of(&["-h", "--list-versions"]), Some(LeadingMode::ShortHelp));
    }

    #[test]
    fn flags_after_list_versions_are_ignored() {
        assert_eq!(
            mode_of(&["--list-versions", "--frobnicate"]),
            Some(LeadingMode::ListVersions { json: false })
        );
        assert_eq!(
            mode_of(&["--list-versions", "--frobnicate", "--json"]),
            Some(LeadingMode::ListVersions { json: true })
        );
    }

    #[test]
    fn json_before_list_versions_is_honoured() {
        assert_eq!(
            mode_of(&["--json", "--list-versions"]),
            Some(LeadingMode::ListVersions { json: true })
        );
    }

    #[test]
    fn install_flags_are_skipped_with_their_values() {
        assert_eq!(
            mode_of(&["-v", "9.9.9", "--dir", "/opt", "--dry-run", "--help"]),
            Some(LeadingMode::LongHelp)
        );
        assert_eq!(
            mode_of(&["--version=1.0.0", "-d/opt", "-y", "--list-versions"]),
            Some(LeadingMode::ListVersions { json: false })
        );
    }

    #[test]
    fn unknown_argument_before_mode_defers_to_clap() {
        assert_eq!(mode_of(&["--frobnicate", "--help"]), None);
        assert_eq!(mode_of(&["stray", "--list-versions"]), None);
    }

    #[test]
    fn install_invocations_have_no_leading_mode() {
        assert_eq!(mode_of(&[]), None);
        assert_eq!(mode_of(&["--dry-run", "--json"]), None);
        assert_eq!(mode_of(&["--version", "1.12.4"]), None);
    }

    #[test]
    fn json_requires_dry_run_or_list_versions() {
        let err = Cli::try_parse_from(["tctl-install", "--json"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        assert!(Cli::try_parse_from(["tctl-install", "--dry-run", "--json"]).is_ok());
        assert!(Cli::try_parse_from(["tctl-install", "--list-versions", "--json"]).is_ok());
    }
}
