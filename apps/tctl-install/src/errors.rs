//! Error types for the tctl installer.
//!
//! Component functions return [`InstallerError`] so the orchestrator can
//! decide which failures roll back, which abort, and which degrade to a
//! warning. Command-level code wraps these in `anyhow::Error`.

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for installer operations.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The host OS or CPU architecture has no published artifact.
    #[error("unsupported {kind}: {value}")]
    UnsupportedPlatform {
        /// Which identifier failed to map ("operating system" or "architecture").
        kind: &'static str,
        /// The raw value reported by the system.
        value: String,
    },

    /// Neither `curl` nor `wget` could be found on PATH.
    #[error("no download tool available: install curl or wget and try again")]
    NoDownloadTool,

    /// The download tool failed or left no file behind.
    #[error("download failed for {url}: {reason}")]
    DownloadFailed {
        /// The artifact URL.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// A path is not writable and the operation cannot be escalated.
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        /// The path that could not be written.
        path: PathBuf,
    },

    /// The installed binary could not report its version.
    #[error("could not verify installation: {reason}")]
    VerificationInconclusive {
        /// Why the version check did not succeed.
        reason: String,
    },

    /// The binary is absent at the path being verified.
    #[error("binary not found: {}", path.display())]
    BinaryMissing {
        /// The expected binary location.
        path: PathBuf,
    },

    /// A filesystem or process operation failed.
    #[error("{message}")]
    Io {
        /// Description of the operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The user declined the confirmation prompt.
    #[error("installation cancelled")]
    Cancelled,
}

impl InstallerError {
    /// Creates a new `UnsupportedPlatform` error.
    #[must_use]
    pub fn unsupported_platform(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            kind,
            value: value.into(),
        }
    }

    /// Creates a new `DownloadFailed` error.
    #[must_use]
    pub fn download_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// Creates a new `VerificationInconclusive` error.
    #[must_use]
    pub fn verification_inconclusive(reason: impl Into<String>) -> Self {
        Self::VerificationInconclusive {
            reason: reason.into(),
        }
    }

    /// Creates a new `BinaryMissing` error.
    #[must_use]
    pub fn binary_missing(path: impl Into<PathBuf>) -> Self {
        Self::BinaryMissing { path: path.into() }
    }

    /// Creates a new `Io` error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}
