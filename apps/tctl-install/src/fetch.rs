//! Artifact URL construction and download.
//!
//! Downloads are delegated to an external HTTPS client: `curl` when it is on
//! PATH, otherwise `wget`. Each run makes exactly one attempt with the
//! selected tool.
//!
//! The downloaded bytes are not checksummed or signature-checked.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::InstallerConfig;
use crate::errors::InstallerError;
use crate::platform::PlatformId;
use crate::privilege::Privilege;

/// Returns the download URL of `version` for `platform`.
///
/// Format: `https://<host>/public/raw/versions/<os>-<arch>-<version>/<binary><suffix>`.
#[must_use]
pub fn build_url(config: &InstallerConfig, platform: PlatformId, version: &str) -> String {
    format!(
        "https://{host}/public/raw/versions/{platform}-{version}/{binary}{suffix}",
        host = config.download_host,
        binary = config.binary_name,
        suffix = platform.executable_suffix(),
    )
}

/// Something that can place the bytes at `url` into `dest`.
pub trait Fetcher {
    /// Downloads `url` to `dest`, writing with the given privilege.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::DownloadFailed`] if the transfer does not
    /// complete or `dest` is absent afterwards.
    fn fetch(&self, url: &str, dest: &Path, privilege: Privilege) -> Result<(), InstallerError>;
}

/// Supported external download tools, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTool {
    Curl,
    Wget,
}

impl DownloadTool {
    /// All tools, preferred first.
    pub const PREFERENCE: [Self; 2] = [Self::Curl, Self::Wget];

    /// Executable name looked up on PATH.
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Curl => "curl",
            Self::Wget => "wget",
        }
    }

    /// Arguments for a quiet download of `url` into `dest`.
    #[must_use]
    pub fn args(self, url: &str, dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = match self {
            Self::Curl => vec!["-fsSL".into(), "-o".into()],
            Self::Wget => vec!["-q".into(), "-O".into()],
        };
        args.push(dest.as_os_str().to_owned());
        args.push(url.into());
        args
    }
}

impl fmt::Display for DownloadTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// [`Fetcher`] backed by `curl` or `wget`.
#[derive(Debug, Clone)]
pub struct ToolFetcher {
    tool: DownloadTool,
    program: PathBuf,
}

impl ToolFetcher {
    /// Creates a fetcher that runs `program` with `tool`'s argument style.
    #[must_use]
    pub fn new(tool: DownloadTool, program: PathBuf) -> Self {
        Self { tool, program }
    }

    /// Finds the preferred download tool on PATH.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::NoDownloadTool`] if neither `curl` nor `wget`
    /// is installed.
    pub fn locate() -> Result<Self, InstallerError> {
        Self::locate_with(|name| which::which(name).ok())
    }

    fn locate_with(lookup: impl Fn(&str) -> Option<PathBuf>) -> Result<Self, InstallerError> {
        DownloadTool::PREFERENCE
            .into_iter()
            .find_map(|tool| lookup(tool.program()).map(|program| Self::new(tool, program)))
            .inspect(|fetcher| {
                log::info!("using {} at {}", fetcher.tool, fetcher.program.display());
            })
            .ok_or(InstallerError::NoDownloadTool)
    }

    /// The selected tool.
    #[must_use]
    pub fn tool(&self) -> DownloadTool {
        self.tool
    }
}

impl Fetcher for ToolFetcher {
    fn fetch(&self, url: &str, dest: &Path, privilege: Privilege) -> Result<(), InstallerError> {
        let mut cmd = privilege.command(&self.program, dest)?;
        cmd.args(self.tool.args(url, dest));
        log::debug!("running {cmd:?}");

        let status = cmd.status().map_err(|e| {
            InstallerError::download_failed(url, format!("could not run {}: {e}", self.tool))
        })?;

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
            return Err(InstallerError::download_failed(
                url,
                format!("{} exited with {code}", self.tool),
            ));
        }

        if !dest.exists() {
            return Err(InstallerError::download_failed(
                url,
                format!("{} reported success but {} is missing", self.tool, dest.display()),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn url_for_linux_amd64() {
        let config = InstallerConfig::default();
        let platform = PlatformId::from_raw("Linux", "x86_64").unwrap();
        assert_eq!(
            build_url(&config, platform, "1.12.5"),
            "https://binaries.dl.tetrate.io/public/raw/versions/linux-amd64-1.12.5/tctl"
        );
    }

    #[test]
    fn url_for_windows_has_exe_suffix() {
        let config = InstallerConfig::default();
        let platform = PlatformId::from_raw("MINGW64_NT-10.0", "x86_64").unwrap();
        assert_eq!(
            build_url(&config, platform, "9.9.9"),
            "https://binaries.dl.tetrate.io/public/raw/versions/windows-amd64-9.9.9/tctl.exe"
        );
    }

    #[test]
    fn url_uses_configured_host() {
        let config = InstallerConfig {
            download_host: "mirror.internal".to_string(),
            ..InstallerConfig::default()
        };
        let platform = PlatformId::from_raw("Darwin", "arm64").unwrap();
        assert_eq!(
            build_url(&config, platform, "1.12.0"),
            "https://mirror.internal/public/raw/versions/darwin-arm64-1.12.0/tctl"
        );
    }

    #[test]
    fn curl_is_preferred_over_wget() {
        let fetcher =
            ToolFetcher::locate_with(|name| Some(PathBuf::from(format!("/usr/bin/{name}"))))
                .unwrap();
        assert_eq!(fetcher.tool(), DownloadTool::Curl);
    }

    #[test]
    fn wget_is_used_when_curl_is_missing() {
        let fetcher =
            ToolFetcher::locate_with(|name| (name == "wget").then(|| PathBuf::from("/usr/bin/wget")))
                .unwrap();
        assert_eq!(fetcher.tool(), DownloadTool::Wget);
    }

    #[test]
    fn no_tool_is_an_error() {
        let err = ToolFetcher::locate_with(|_| None).unwrap_err();
        assert!(matches!(err, InstallerError::NoDownloadTool));
    }

    #[test]
    fn tool_args_put_destination_before_url() {
        let dest = Path::new("/tmp/tctl");
        let args = DownloadTool::Curl.args("https://h/tctl", dest);
        assert_eq!(args, ["-fsSL", "-o", "/tmp/tctl", "https://h/tctl"]);

        let args = DownloadTool::Wget.args("https://h/tctl", dest);
        assert_eq!(args, ["-q", "-O", "/tmp/tctl", "https://h/tctl"]);
    }

    /// Writes a shell script standing in for a download tool.
    #[cfg(unix)]
    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-curl");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial(spawn)]
    fn fetch_writes_destination() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), r#"printf 'new-binary' > "$3""#);
        let dest = temp.path().join("tctl");

        ToolFetcher::new(DownloadTool::Curl, tool)
            .fetch("https://h/tctl", &dest, Privilege::User)
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new-binary");
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial(spawn)]
    fn fetch_reports_tool_failure() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "exit 22");
        let dest = temp.path().join("tctl");

        let err = ToolFetcher::new(DownloadTool::Curl, tool)
            .fetch("https://h/tctl", &dest, Privilege::User)
            .unwrap_err();

        match err {
            InstallerError::DownloadFailed { url, reason } => {
                assert_eq!(url, "https://h/tctl");
                assert!(reason.contains("status 22"), "{reason}");
            }
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial(spawn)]
    fn fetch_requires_destination_to_exist() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "exit 0");
        let dest = temp.path().join("tctl");

        let err = ToolFetcher::new(DownloadTool::Curl, tool)
            .fetch("https://h/tctl", &dest, Privilege::User)
            .unwrap_err();

        assert!(matches!(err, InstallerError::DownloadFailed { .. }));
    }
}
