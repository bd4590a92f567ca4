//! Install orchestration.
//!
//! [`Installer::install`] walks a fixed sequence of stages:
//!
//! ```text
//! PermissionChecked -> DirectoryEnsured -> BackedUp? -> Downloaded
//!   -> PermissionsSet -> PlatformHardened? -> Verified -> Committed
//! ```
//!
//! Any failure after the backup stage restores the previous binary before the
//! error is returned, so a failed upgrade leaves the old `tctl` in place.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::InstallerConfig;
use crate::errors::InstallerError;
use crate::fetch::{Fetcher, build_url};
use crate::output;
use crate::platform::PlatformId;
use crate::privilege::Privilege;
use crate::verify::{Verification, clear_quarantine, verify_binary};

/// Suffix appended to the existing binary while an upgrade is in flight.
const BACKUP_SUFFIX: &str = ".backup";

/// Everything needed to resolve the download URL and destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub version: String,
    pub install_dir: PathBuf,
    pub platform: PlatformId,
    pub dry_run: bool,
}

impl InstallRequest {
    /// Builds a request, filling unset values from `config`.
    #[must_use]
    pub fn new(
        config: &InstallerConfig,
        version: Option<String>,
        install_dir: Option<PathBuf>,
        platform: PlatformId,
        dry_run: bool,
    ) -> Self {
        Self {
            version: version.unwrap_or_else(|| config.default_version.clone()),
            install_dir: install_dir.unwrap_or_else(|| config.default_install_dir.clone()),
            platform,
            dry_run,
        }
    }

    /// Final location of the installed binary.
    #[must_use]
    pub fn binary_path(&self, config: &InstallerConfig) -> PathBuf {
        self.install_dir.join(format!(
            "{}{}",
            config.binary_name,
            self.platform.executable_suffix()
        ))
    }

    /// URL the artifact is downloaded from.
    #[must_use]
    pub fn url(&self, config: &InstallerConfig) -> String {
        build_url(config, self.platform, &self.version)
    }

    /// Resolves the request without touching the filesystem.
    #[must_use]
    pub fn plan(&self, config: &InstallerConfig) -> InstallPlan {
        InstallPlan {
            version: self.version.clone(),
            platform: self.platform,
            url: self.url(config),
            path: self.binary_path(config),
        }
    }
}

/// What an install would do; printed by `--dry-run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    pub version: String,
    pub platform: PlatformId,
    pub url: String,
    pub path: PathBuf,
}

/// The on-disk binary and, during an upgrade, its backup sibling.
#[derive(Debug)]
pub struct InstalledArtifact {
    pub path: PathBuf,
    pub backup_path: Option<PathBuf>,
}

impl InstalledArtifact {
    /// Moves any existing binary at `path` aside to `<path>.backup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing binary cannot be moved.
    pub fn prepare(path: PathBuf, privilege: Privilege) -> Result<Self, InstallerError> {
        if !path.exists() {
            return Ok(Self {
                path,
                backup_path: None,
            });
        }

        let backup = backup_path_for(&path);
        output::step(&format!("Backing up existing binary to {}", backup.display()));
        privilege.rename(&path, &backup)?;
        Ok(Self {
            path,
            backup_path: Some(backup),
        })
    }

    /// Puts the previous binary back, discarding whatever is at `path`.
    ///
    /// Without a backup the partial download, if any, is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be moved back.
    pub fn restore(&mut self, privilege: Privilege) -> Result<(), InstallerError> {
        match self.backup_path.take() {
            Some(backup) => {
                output::step("Restoring previous binary");
                if let Err(e) = privilege.rename(&backup, &self.path) {
                    self.backup_path = Some(backup);
                    return Err(e);
                }
                Ok(())
            }
            None => privilege.remove_file(&self.path),
        }
    }

    /// Deletes the backup once the new binary is in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup exists and cannot be removed.
    pub fn commit(&mut self, privilege: Privilege) -> Result<(), InstallerError> {
        if let Some(backup) = &self.backup_path {
            privilege.remove_file(backup)?;
            self.backup_path = None;
        }
        Ok(())
    }
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Stages an install passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PermissionChecked,
    DirectoryEnsured,
    BackedUp,
    Downloaded,
    PermissionsSet,
    PlatformHardened,
    Verified,
    Committed,
    RolledBack,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PermissionChecked => "permission-checked",
            Self::DirectoryEnsured => "directory-ensured",
            Self::BackedUp => "backed-up",
            Self::Downloaded => "downloaded",
            Self::PermissionsSet => "permissions-set",
            Self::PlatformHardened => "platform-hardened",
            Self::Verified => "verified",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
        };
        f.write_str(name)
    }
}

/// Result of a completed install.
#[derive(Debug)]
pub struct InstallOutcome {
    pub path: PathBuf,
    pub privilege: Privilege,
    pub verification: Verification,
    pub stages: Vec<Stage>,
}

/// Runs installs with a given download backend.
pub struct Installer<'a, F> {
    config: &'a InstallerConfig,
    fetcher: F,
}

impl<'a, F: Fetcher> Installer<'a, F> {
    #[must_use]
    pub fn new(config: &'a InstallerConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Installs the artifact described by `request`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. When the error happens after an
    /// existing binary was backed up, the backup is restored first.
    pub fn install(&self, request: &InstallRequest) -> Result<InstallOutcome, InstallerError> {
        self.install_recording(request, &mut Vec::new())
    }

    /// Like [`Installer::install`], appending every stage reached to `stages`.
    ///
    /// On failure `stages` ends with [`Stage::RolledBack`] once the previous
    /// state has been restored.
    ///
    /// # Errors
    ///
    /// Same as [`Installer::install`].
    pub fn install_recording(
        &self,
        request: &InstallRequest,
        stages: &mut Vec<Stage>,
    ) -> Result<InstallOutcome, InstallerError> {
        let dir = &request.install_dir;

        let privilege = Privilege::for_dir(dir);
        advance(stages, Stage::PermissionChecked);

        if !dir.exists() {
            output::step(&format!("Creating {}", dir.display()));
            privilege.create_dir_all(dir)?;
        }
        advance(stages, Stage::DirectoryEnsured);

        let mut artifact = InstalledArtifact::prepare(request.binary_path(self.config), privilege)?;
        if artifact.backup_path.is_some() {
            advance(stages, Stage::BackedUp);
        }

        match self.download_and_verify(request, &artifact.path, privilege, stages) {
            Ok(verification) => {
                if let Err(e) = artifact.commit(privilege) {
                    output::warn(&format!("Could not remove backup: {e}"));
                }
                advance(stages, Stage::Committed);
                Ok(InstallOutcome {
                    path: artifact.path,
                    privilege,
                    verification,
                    stages: stages.clone(),
                })
            }
            Err(e) => {
                log::debug!("install failed at {:?}: {e}", stages.last());
                match artifact.restore(privilege) {
                    Ok(()) => advance(stages, Stage::RolledBack),
                    Err(restore_err) => {
                        output::warn(&format!("Could not restore previous binary: {restore_err}"));
                        if let Some(backup) = &artifact.backup_path {
                            output::warn(&format!(
                                "Previous binary kept at {} for manual recovery",
                                backup.display()
                            ));
                        }
                    }
                }
                Err(e)
            }
        }
    }

    fn download_and_verify(
        &self,
        request: &InstallRequest,
        path: &Path,
        privilege: Privilege,
        stages: &mut Vec<Stage>,
    ) -> Result<Verification, InstallerError> {
        let url = request.url(self.config);
        output::step(&format!(
            "Downloading {} {} for {}",
            self.config.binary_name, request.version, request.platform
        ));
        log::info!("downloading {url} to {}", path.display());
        self.fetcher.fetch(&url, path, privilege)?;
        if !path.exists() {
            return Err(InstallerError::binary_missing(path));
        }
        advance(stages, Stage::Downloaded);

        privilege.set_executable(path)?;
        advance(stages, Stage::PermissionsSet);

        if request.platform.is_darwin() {
            clear_quarantine(path, privilege);
            advance(stages, Stage::PlatformHardened);
        }

        let verification = verify_binary(path, request.platform, privilege)?;
        advance(stages, Stage::Verified);
        Ok(verification)
    }
}

fn advance(stages: &mut Vec<Stage>, stage: Stage) {
    log::debug!("stage: {stage}");
    stages.push(stage);
}
