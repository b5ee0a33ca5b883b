//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that validate CLI-specific input, call the composed
//!   services, and format output for the terminal
//! - Failures that need a specific exit code are raised as `CliError`

pub mod cache;
pub mod check;
pub mod download;
pub mod paths;
pub mod play;
