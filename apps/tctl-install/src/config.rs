//! Installer configuration.
//!
//! All defaults live in an immutable [`InstallerConfig`] that is built once in
//! `main` and passed by reference to each component. The download host and
//! colour output can be overridden through environment variables.

use std::path::PathBuf;

/// Environment variable that overrides the artifact download host.
pub const DOWNLOAD_HOST_ENV: &str = "TCTL_DOWNLOAD_HOST";

/// Environment variable that disables coloured output when set.
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Default host serving the `tctl` artifacts.
pub const DEFAULT_DOWNLOAD_HOST: &str = "binaries.dl.tetrate.io";

/// Version installed when `--version` is not given.
pub const DEFAULT_VERSION: &str = "1.12.5";

/// Directory used when `--dir` is not given.
pub const DEFAULT_INSTALL_DIR: &str = "/usr/local/bin";

/// Name of the installed executable, without platform suffix.
pub const BINARY_NAME: &str = "tctl";

/// Versions known to be published, newest first.
pub const KNOWN_VERSIONS: &[&str] = &[
    "1.12.5", "1.12.4", "1.12.3", "1.12.2", "1.12.1", "1.12.0", "1.11.3", "1.11.2", "1.11.1",
    "1.11.0", "1.10.2", "1.10.1", "1.10.0",
];

/// Where users can find the complete release list.
pub const DOCS_URL: &str = "https://docs.tetrate.io/service-bridge/releases";

/// Immutable settings shared by every installer component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Executable name without platform suffix.
    pub binary_name: String,
    /// Host serving the versioned artifacts (no scheme, no trailing slash).
    pub download_host: String,
    /// Version used when none is requested.
    pub default_version: String,
    /// Install directory used when none is requested.
    pub default_install_dir: PathBuf,
    /// Static list printed by `--list-versions`.
    pub known_versions: Vec<String>,
    /// Documentation link printed by `--list-versions`.
    pub docs_url: String,
    /// Whether terminal output may use ANSI colours.
    pub color: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            binary_name: BINARY_NAME.to_string(),
            download_host: DEFAULT_DOWNLOAD_HOST.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
            default_install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            known_versions: KNOWN_VERSIONS.iter().map(|v| (*v).to_string()).collect(),
            docs_url: DOCS_URL.to_string(),
            color: true,
        }
    }
}

impl InstallerConfig {
    /// Builds the configuration from defaults plus environment overrides.
    ///
    /// Empty or whitespace-only values are treated as unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration using an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup(DOWNLOAD_HOST_ENV).filter(|s| !s.trim().is_empty()) {
            config.download_host = normalize_host(&host);
        }

        if lookup(NO_COLOR_ENV).is_some_and(|s| !s.is_empty()) {
            config.color = false;
        }

        config
    }
}

/// Strips an optional scheme and trailing slashes from a host override.
fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}
