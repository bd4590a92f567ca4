//! Terminal output helpers.
//!
//! Progress goes to stdout, warnings to stderr. Colour is controlled once in
//! `main` from [`crate::config::InstallerConfig::color`].

use colored::Colorize;

/// Applies the colour preference for the rest of the process.
pub fn init_color(enabled: bool) {
    if !enabled {
        colored::control::set_override(false);
    }
}

/// Prints a progress step.
pub fn step(message: &str) {
    println!("{} {message}", "==>".blue().bold());
}

/// Prints a success line.
pub fn success(message: &str) {
    println!("{} {message}", "✓".green().bold());
}

/// Prints a non-fatal warning to stderr.
pub fn warn(message: &str) {
    eprintln!("{} {message}", "Warning:".yellow().bold());
}
