//! Write-permission checks and the privilege capability.
//!
//! [`check_permissions`] decides whether the current user can write to the
//! install directory. When it cannot, the installer does not abort; it
//! selects [`Privilege::Elevated`] and every filesystem-mutating step is
//! routed through `sudo` instead of `std::fs`.

use std::path::Path;
use std::process::Command;

use crate::errors::InstallerError;
use crate::output;

/// Returns whether the current user can write to `dir`, or create it.
///
/// If `dir` exists the directory itself must be writable. Otherwise its
/// parent must be writable.
#[must_use]
pub fn check_permissions(dir: &Path) -> bool {
    if dir.exists() {
        return is_writable(dir);
    }

    match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => is_writable(parent),
        _ => is_writable(Path::new(".")),
    }
}

#[cfg(unix)]
fn is_writable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| !m.permissions().readonly())
}

/// Returns whether the process already runs with administrative rights.
#[must_use]
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::geteuid().is_root()
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Capability passed to every operation that mutates the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Operate as the invoking user.
    User,
    /// Re-run each mutation through `sudo`.
    Elevated,
}

impl Privilege {
    /// Chooses the privilege needed to install into `dir`.
    ///
    /// Prints a warning when escalation is required.
    #[must_use]
    pub fn for_dir(dir: &Path) -> Self {
        if check_permissions(dir) || is_root() {
            return Self::User;
        }

        output::warn(&format!(
            "No write permission for {}. Will use sudo for installation.",
            dir.display()
        ));
        log::info!("escalating privilege for {}", dir.display());
        Self::Elevated
    }

    /// Builds a command for `program`, prefixed with `sudo` when elevated.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::PermissionDenied`] when elevation is needed
    /// but `sudo` is not available.
    pub fn command(
        self,
        program: impl AsRef<std::ffi::OsStr>,
        target: &Path,
    ) -> Result<Command, InstallerError> {
        match self {
            Self::User => Ok(Command::new(program)),
            Self::Elevated => {
                let sudo =
                    which::which("sudo").map_err(|_| InstallerError::permission_denied(target))?;
                let mut cmd = Command::new(sudo);
                cmd.arg(program);
                Ok(cmd)
            }
        }
    }

    /// Creates `dir` and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create_dir_all(self, dir: &Path) -> Result<(), InstallerError> {
        match self {
            Self::User => std::fs::create_dir_all(dir).map_err(|e| {
                InstallerError::io(format!("Failed to create directory: {}", dir.display()), e)
            }),
            Self::Elevated => {
                let mut cmd = self.command("mkdir", dir)?;
                cmd.arg("-p").arg(dir);
                run_elevated(cmd, dir, "mkdir")
            }
        }
    }

    /// Moves `from` to `to`, replacing `to` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the move fails.
    pub fn rename(self, from: &Path, to: &Path) -> Result<(), InstallerError> {
        match self {
            Self::User => std::fs::rename(from, to).map_err(|e| {
                InstallerError::io(
                    format!("Failed to move {} to {}", from.display(), to.display()),
                    e,
                )
            }),
            Self::Elevated => {
                let mut cmd = self.command("mv", to)?;
                cmd.arg("-f").arg(from).arg(to);
                run_elevated(cmd, to, "mv")
            }
        }
    }

    /// Removes `path`. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed.
    pub fn remove_file(self, path: &Path) -> Result<(), InstallerError> {
        match self {
            Self::User => match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(InstallerError::io(
                    format!("Failed to remove {}", path.display()),
                    e,
                )),
            },
            Self::Elevated => {
                let mut cmd = self.command("rm", path)?;
                cmd.arg("-f").arg(path);
                run_elevated(cmd, path, "rm")
            }
        }
    }

    /// Adds executable bits to `path` (no-op on Windows).
    ///
    /// # Errors
    ///
    /// Returns an error if the permissions cannot be changed.
    pub fn set_executable(self, path: &Path) -> Result<(), InstallerError> {
        match self {
            Self::User => set_executable_permissions(path),
            Self::Elevated => {
                let mut cmd = self.command("chmod", path)?;
                cmd.arg("+x").arg(path);
                run_elevated(cmd, path, "chmod")
            }
        }
    }
}

/// Adds `u+x,g+x,o+x` to the file mode, keeping the other bits.
#[cfg(unix)]
fn set_executable_permissions(path: &Path) -> Result<(), InstallerError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| {
            InstallerError::io(format!("Failed to get metadata: {}", path.display()), e)
        })?
        .permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms).map_err(|e| {
        InstallerError::io(format!("Failed to set permissions: {}", path.display()), e)
    })
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_executable_permissions(_path: &Path) -> Result<(), InstallerError> {
    Ok(())
}

/// Runs a `sudo` command, mapping a non-zero exit to `PermissionDenied`.
fn run_elevated(mut cmd: Command, target: &Path, what: &str) -> Result<(), InstallerError> {
    log::debug!("running elevated {what} on {}", target.display());
    let status = cmd
        .status()
        .map_err(|e| InstallerError::io(format!("Failed to run sudo {what}"), e))?;
    if status.success() {
        Ok(())
    } else {
        Err(InstallerError::permission_denied(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn fresh_temp_dir_is_writable() {
        let temp = TempDir::new().unwrap();
        assert!(check_permissions(temp.path()));
    }

    #[test]
    fn missing_dir_checks_parent() {
        let temp = TempDir::new().unwrap();
        assert!(check_permissions(&temp.path().join("not-yet-created")));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_dir_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        if is_root() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        assert!(!check_permissions(&locked));
        assert!(!check_permissions(&locked.join("child")));

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn writable_dir_selects_user_privilege() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Privilege::for_dir(temp.path()), Privilege::User);
    }

    #[test]
    fn user_privilege_file_operations() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        Privilege::User.create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());

        let from = nested.join("tctl");
        let to = nested.join("tctl.backup");
        std::fs::write(&from, b"old").unwrap();
        Privilege::User.rename(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"old");

        Privilege::User.remove_file(&to).unwrap();
        assert!(!to.exists());
        Privilege::User.remove_file(&to).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn set_executable_adds_exec_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("tctl");
        std::fs::write(&file, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

        Privilege::User.set_executable(&file).unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn user_command_is_not_wrapped() {
        let cmd = Privilege::User.command("curl", Path::new("/tmp")).unwrap();
        assert_eq!(cmd.get_program(), "curl");
    }
}
