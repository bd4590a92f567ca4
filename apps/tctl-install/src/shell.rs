//! PATH guidance printed after a successful install.
//!
//! When the install directory is not on `PATH`, the installer tells the user
//! how to add it. The instructions name the profile file of the detected
//! shell (`~/.zshrc` for zsh, `~/.bashrc` for bash) and fall back to a
//! generic `export` line for anything else.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Shells with tailored guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
}

impl Shell {
    /// Detects the user's shell from the `SHELL` environment variable.
    ///
    /// Returns `None` if the shell cannot be determined or has no tailored
    /// guidance.
    #[must_use]
    pub fn detect() -> Option<Self> {
        let shell_path = std::env::var("SHELL").ok()?;
        Self::from_path(&shell_path)
    }

    /// Parses a shell from a path string (e.g., "/bin/bash").
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let shell_name = Path::new(path).file_name()?.to_str()?;
        match shell_name {
            "bash" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            _ => None,
        }
    }

    /// Returns the profile file this shell reads for interactive sessions.
    #[must_use]
    pub fn profile(self, home_dir: &Path) -> PathBuf {
        match self {
            Self::Bash => home_dir.join(".bashrc"),
            Self::Zsh => home_dir.join(".zshrc"),
        }
    }
}

/// Returns whether `dir` is one of the entries of a `PATH`-style value.
#[must_use]
pub fn dir_in_path(dir: &Path, path_var: Option<&OsStr>) -> bool {
    let Some(path_var) = path_var else {
        return false;
    };
    let dir = normalize(dir);
    std::env::split_paths(path_var).any(|entry| normalize(&entry) == dir)
}

/// Strips trailing separators so `/usr/local/bin/` matches `/usr/local/bin`.
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Builds the `export PATH=...` line for `dir`, escaped for double quotes.
#[must_use]
pub fn export_line(dir: &Path) -> String {
    let escaped_path = dir
        .display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('$', "\\$")
        .replace('`', "\\`")
        .replace('"', "\\\"");
    format!("export PATH=\"{escaped_path}:$PATH\"")
}

/// Returns the lines telling the user how to put `dir` on PATH.
#[must_use]
pub fn path_guidance(dir: &Path, shell: Option<Shell>, home_dir: Option<&Path>) -> Vec<String> {
    let export = export_line(dir);
    let mut lines = vec![format!("{} is not in your PATH.", dir.display())];

    match (shell, home_dir) {
        (Some(shell), Some(home)) => {
            let profile = shell.profile(home);
            lines.push("Add it by running:".to_string());
            lines.push(format!("  echo '{export}' >> {}", profile.display()));
            lines.push(format!("  source {}", profile.display()));
        }
        _ => {
            lines.push("Add the following line to your shell profile:".to_string());
            lines.push(format!("  {export}"));
        }
    }

    lines
}
