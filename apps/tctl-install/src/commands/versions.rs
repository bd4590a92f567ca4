//! `--list-versions` mode.
//!
//! Prints the static list of published `tctl` versions and a link to the
//! release notes. No network access is involved.
//!
//! ## Output Format
//!
//! ```text
//! Available tctl versions:
//!
//!   1.12.5 (latest)
//!   1.12.4
//!   ...
//!
//! Full release list: https://docs.tetrate.io/service-bridge/releases
//! ```

use anyhow::Result;
use serde::Serialize;

use crate::config::InstallerConfig;

/// Version information for JSON output.
#[derive(Debug, Clone, Serialize)]
struct VersionInfo<'a> {
    version: &'a str,
    latest: bool,
}

/// Prints the known versions in text or JSON form.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(config: &InstallerConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(config)?);
    } else {
        print!("{}", render_text(config));
    }
    Ok(())
}

fn render_json(config: &InstallerConfig) -> Result<String> {
    let infos: Vec<VersionInfo<'_>> = config
        .known_versions
        .iter()
        .enumerate()
        .map(|(i, v)| VersionInfo {
            version: v,
            latest: i == 0,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&infos)?)
}

fn render_text(config: &InstallerConfig) -> String {
    let mut out = format!("Available {} versions:\n\n", config.binary_name);
    for (i, version) in config.known_versions.iter().enumerate() {
        if i == 0 {
            out.push_str(&format!("  {version} (latest)\n"));
        } else {
            out.push_str(&format!("  {version}\n"));
        }
    }
    out.push_str(&format!("\nFull release list: {}\n", config.docs_url));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lists_every_version_and_docs_link() {
        let config = InstallerConfig::default();
        let text = render_text(&config);

        assert!(text.starts_with("Available tctl versions:"));
        assert!(text.contains("  1.12.5 (latest)\n"));
        for version in &config.known_versions {
            assert!(text.contains(version.as_str()), "missing {version}");
        }
        assert!(text.contains(&config.docs_url));
    }

    #[test]
    fn json_marks_only_first_as_latest() {
        let config = InstallerConfig::default();
        let json = render_json(&config).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = parsed.as_array().unwrap();

        assert_eq!(entries.len(), config.known_versions.len());
        assert_eq!(entries[0]["version"], "1.12.5");
        assert_eq!(entries[0]["latest"], true);
        assert!(entries[1..].iter().all(|e| e["latest"] == false));
    }
}
