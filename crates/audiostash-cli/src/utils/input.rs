//! User input utilities for interactive command-line prompts.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Prompts the user for a yes/no confirmation on stdin.
///
/// Returns `true` only for `y` or `yes` (case-insensitive).
pub fn prompt_confirmation(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N]: ");
    io::stdout().flush().context("Failed to flush prompt")?;
    read_confirmation(&mut io::stdin().lock())
}

fn read_confirmation(reader: &mut impl BufRead) -> Result<bool> {
    let mut input = String::new();
    reader
        .read_line(&mut input)
        .context("Failed to read user input")?;
    Ok(matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
