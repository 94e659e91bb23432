//! Shell completion generation utilities
//!
//! This module provides functions for generating shell completion scripts
//! for various shells (bash, zsh, fish, powershell).

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

/// Parse a shell name string into a Shell enum
///
/// # Examples
///
/// ```
/// use business_simulation::completion::parse_shell_name;
/// use clap_complete::Shell;
///
/// assert_eq!(parse_shell_name("bash"), Some(Shell::Bash));
/// assert_eq!(parse_shell_name("PWSH"), Some(Shell::PowerShell));
/// assert_eq!(parse_shell_name("unknown"), None);
/// ```
pub fn parse_shell_name(shell_name: &str) -> Option<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        _ => None,
    }
}

/// Get a list of supported shell names
pub fn get_supported_shells() -> Vec<&'static str> {
    vec!["bash", "zsh", "fish", "powershell"]
}

/// Generate a completion script for the specified shell and command,
/// written to the provided writer.
pub fn generate_completion<T: CommandFactory>(
    shell: Shell,
    bin_name: &str,
    writer: &mut dyn io::Write,
) {
    let mut cmd = T::command();
    generate(shell, &mut cmd, bin_name, writer);
}
