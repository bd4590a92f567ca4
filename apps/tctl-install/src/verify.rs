//! Post-install verification of the downloaded binary.
//!
//! Verification makes sure the binary is executable, clears the macOS
//! quarantine attribute, and asks the binary for its version. A binary that
//! cannot report its version still counts as installed.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::errors::InstallerError;
use crate::output;
use crate::platform::PlatformId;
use crate::privilege::Privilege;

/// Extended attribute macOS attaches to downloaded files.
const QUARANTINE_ATTR: &str = "com.apple.quarantine";

/// Outcome of a successful verification.
#[derive(Debug)]
pub enum Verification {
    /// The binary ran and printed its version.
    Confirmed {
        /// Trimmed stdout of `<binary> version`.
        output: String,
    },
    /// The binary is in place but its version could not be read.
    Inconclusive(InstallerError),
}

/// Verifies the binary at `path`.
///
/// # Errors
///
/// Returns [`InstallerError::BinaryMissing`] if `path` does not exist, or an
/// I/O error if executable permissions cannot be applied. A failing version
/// check is reported as [`Verification::Inconclusive`], not as an error.
pub fn verify_binary(
    path: &Path,
    platform: PlatformId,
    privilege: Privilege,
) -> Result<Verification, InstallerError> {
    if !path.exists() {
        return Err(InstallerError::binary_missing(path));
    }

    if !is_executable(path) {
        log::debug!("adding executable bits to {}", path.display());
        privilege.set_executable(path)?;
    }

    if platform.is_darwin() {
        clear_quarantine(path, privilege);
    }

    let verification = run_version_check(path);
    match &verification {
        Verification::Confirmed { .. } => output::success("Installation verified"),
        Verification::Inconclusive(e) => output::warn(&e.to_string()),
    }
    Ok(verification)
}

/// Removes the quarantine attribute from `path`.
///
/// Best-effort: the attribute is often absent, and installation does not
/// depend on its removal, so every failure is discarded.
pub fn clear_quarantine(path: &Path, privilege: Privilege) {
    let Ok(mut cmd) = privilege.command("xattr", path) else {
        return;
    };
    let result = cmd
        .arg("-d")
        .arg(QUARANTINE_ATTR)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    log::debug!("xattr -d {QUARANTINE_ATTR} {}: {result:?}", path.display());
}

fn run_version_check(path: &Path) -> Verification {
    match Command::new(path).arg("version").output() {
        Ok(out) if out.status.success() => Verification::Confirmed {
            output: String::from_utf8_lossy(&out.stdout).trim().to_string(),
        },
        Ok(out) => Verification::Inconclusive(InstallerError::verification_inconclusive(
            format!("`{} version` exited with {}", path.display(), out.status),
        )),
        Err(e) => Verification::Inconclusive(InstallerError::verification_inconclusive(
            format!("could not run {}: {e}", path.display()),
        )),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 == 0o111)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
