//! Platform detection for the tctl installer.
//!
//! Maps the raw kernel name and machine hardware strings reported by the
//! system onto the `<os>-<arch>` pair used in artifact URLs.
//!
//! ## Mapping
//!
//! | Raw value                         | Normalized |
//! |-----------------------------------|------------|
//! | `Linux*`                          | `linux`    |
//! | `Darwin*`                         | `darwin`   |
//! | `MINGW*`, `CYGWIN*`, `MSYS*`      | `windows`  |
//! | `x86_64`, `amd64`                 | `amd64`    |
//! | `aarch64`, `arm64`                | `arm64`    |
//! | `armv7l`, `armv7`, `arm`          | `arm`      |
//! | `i386`, `i686`                    | `386`      |

use std::fmt;

use serde::Serialize;

use crate::errors::InstallerError;

/// Normalized operating system identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsId {
    Linux,
    Darwin,
    Windows,
}

impl OsId {
    /// Maps a raw kernel name (as printed by `uname -s`) to an [`OsId`].
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] for any unrecognized value.
    pub fn from_kernel_name(raw: &str) -> Result<Self, InstallerError> {
        if raw.starts_with("Linux") {
            Ok(Self::Linux)
        } else if raw.starts_with("Darwin") {
            Ok(Self::Darwin)
        } else if ["MINGW", "CYGWIN", "MSYS"]
            .iter()
            .any(|prefix| raw.starts_with(prefix))
        {
            Ok(Self::Windows)
        } else {
            Err(InstallerError::unsupported_platform("operating system", raw))
        }
    }

    /// Returns the identifier used in artifact URLs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for OsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized CPU architecture identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArchId {
    #[serde(rename = "amd64")]
    Amd64,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "386")]
    I386,
}

impl ArchId {
    /// Maps a raw machine hardware name (as printed by `uname -m`) to an [`ArchId`].
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] for any unrecognized value.
    pub fn from_machine(raw: &str) -> Result<Self, InstallerError> {
        match raw {
            "x86_64" | "amd64" => Ok(Self::Amd64),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            "armv7l" | "armv7" | "arm" => Ok(Self::Arm),
            "i386" | "i686" => Ok(Self::I386),
            _ => Err(InstallerError::unsupported_platform("architecture", raw)),
        }
    }

    /// Returns the identifier used in artifact URLs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::Arm => "arm",
            Self::I386 => "386",
        }
    }
}

impl fmt::Display for ArchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(os, arch)` pair selecting which artifact to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PlatformId {
    pub os: OsId,
    pub arch: ArchId,
}

impl PlatformId {
    /// Builds a platform from raw kernel name and machine strings.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] if either string is unrecognized.
    pub fn from_raw(kernel_name: &str, machine: &str) -> Result<Self, InstallerError> {
        Ok(Self {
            os: OsId::from_kernel_name(kernel_name)?,
            arch: ArchId::from_machine(machine)?,
        })
    }

    /// Detects the platform of the running host.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] if the host OS or
    /// architecture has no published artifact.
    pub fn detect() -> Result<Self, InstallerError> {
        let (kernel_name, machine) = raw_system_names();
        log::debug!("raw platform: kernel={kernel_name} machine={machine}");
        Self::from_raw(&kernel_name, &machine)
    }

    /// Returns the executable suffix for this platform (`.exe` on Windows).
    #[must_use]
    pub fn executable_suffix(self) -> &'static str {
        match self.os {
            OsId::Windows => ".exe",
            OsId::Linux | OsId::Darwin => "",
        }
    }

    /// Returns whether this platform is Windows.
    #[must_use]
    pub fn is_windows(self) -> bool {
        self.os == OsId::Windows
    }

    /// Returns whether this platform is macOS.
    #[must_use]
    pub fn is_darwin(self) -> bool {
        self.os == OsId::Darwin
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Reads the kernel name and machine strings from `uname(2)`.
#[cfg(unix)]
fn raw_system_names() -> (String, String) {
    match nix::sys::utsname::uname() {
        Ok(info) => (
            info.sysname().to_string_lossy().into_owned(),
            info.machine().to_string_lossy().into_owned(),
        ),
        Err(e) => {
            log::warn!("uname failed ({e}), falling back to build target");
            let kernel_name = match std::env::consts::OS {
                "linux" => "Linux",
                "macos" => "Darwin",
                other => other,
            };
            (kernel_name.to_string(), std::env::consts::ARCH.to_string())
        }
    }
}

/// Reports the Windows host the way MSYS-style shells do.
#[cfg(not(unix))]
fn raw_system_names() -> (String, String) {
    let machine = match std::env::consts::ARCH {
        "x86" => "i686",
        other => other,
    };
    ("MINGW64_NT".to_string(), machine.to_string())
}
