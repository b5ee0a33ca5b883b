//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use audiostash_core::PipelineSettings;

use crate::commands::Commands;

/// Command-line interface for the offline audio cache.
#[derive(Parser, Debug)]
#[command(name = "audiostash")]
#[command(about = "Download-first offline cache for remote audio")]
#[command(version)]
pub struct Cli {
    /// Override the cache database location
    #[arg(long = "db-path", global = true)]
    pub db_path: Option<String>,

    /// Downloads allowed in flight at once
    #[arg(long, global = true, env = "AUDIOSTASH_MAX_CONCURRENT")]
    pub max_concurrent: Option<usize>,

    /// Retries after a failed download attempt
    #[arg(long, global = true, env = "AUDIOSTASH_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Pause before a failed download is retried, in milliseconds
    #[arg(long, global = true, env = "AUDIOSTASH_RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,

    /// Bound on a single download attempt, in seconds
    #[arg(long = "timeout-secs", global = true, env = "AUDIOSTASH_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Pipeline settings given on the command line (or via environment).
    pub fn settings_overrides(&self) -> PipelineSettings {
        PipelineSettings {
            max_concurrent: self.max_concurrent,
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            fetch_timeout_secs: self.timeout_secs,
            ..PipelineSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "audiostash",
            "--verbose",
            "--db-path",
            "/tmp/cache.db",
            "--max-retries",
            "0",
            "cache",
            "stats",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.db_path.as_deref(), Some("/tmp/cache.db"));

        let overrides = cli.settings_overrides();
        assert_eq!(overrides.max_retries, Some(0));
        assert_eq!(overrides.default_content_type, None);
    }

    #[test]
    fn test_no_command_is_allowed() {
        let cli = Cli::parse_from(["audiostash"]);
        assert!(cli.command.is_none());
    }
}
