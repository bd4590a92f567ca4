//! Mode implementations for the tctl-install CLI.
//!
//! - [`install`] - Resolve, download, and verify `tctl` (or print the plan with `--dry-run`)
//! - [`versions`] - Print the known release list (`--list-versions`)

pub mod install;
pub mod versions;
