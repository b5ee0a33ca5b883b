//! Main commands enum and subcommands.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download remote audio into the offline cache
    Download {
        /// Source URLs to download
        #[arg(required = true)]
        urls: Vec<String>,
        /// Track identifier to report progress under (single URL only; defaults to the URL)
        #[arg(long)]
        track_id: Option<String>,
    },

    /// Resolve a source for playback
    Play {
        /// Remote URL, or a path to a local audio file
        source: String,
        /// Treat SOURCE as a persisted file handle (permission is checked first)
        #[arg(long, conflicts_with = "download")]
        handle: bool,
        /// Download the source first if it is not cached yet
        #[arg(short, long)]
        download: bool,
        /// Write the resolved audio to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report whether sources can play right now
    Check {
        /// Remote URLs or local paths
        #[arg(required = true)]
        sources: Vec<String>,
    },

    /// Inspect or prune the offline cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Show resolved data and database paths
    Paths,
}

/// Cache maintenance subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    /// Show entry count and total size
    Stats,
    /// List cached URLs, oldest first
    List,
    /// Remove one cached URL
    Remove {
        /// URL to remove
        url: String,
    },
    /// Remove every cached entry
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::parser::Cli;

    #[test]
    fn test_download_requires_url() {
        assert!(Cli::try_parse_from(["audiostash", "download"]).is_err());

        let cli = Cli::parse_from([
            "audiostash",
            "download",
            "https://cdn.test/a.mp3",
            "https://cdn.test/b.mp3",
        ]);
        let Some(Commands::Download { urls, track_id }) = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(urls.len(), 2);
        assert!(track_id.is_none());
    }

    #[test]
    fn test_play_flags() {
        let cli = Cli::parse_from([
            "audiostash",
            "play",
            "https://cdn.test/a.mp3",
            "--download",
            "-o",
            "out.mp3",
        ]);
        let Some(Commands::Play {
            source,
            handle,
            download,
            output,
        }) = cli.command
        else {
            panic!("expected play command");
        };
        assert_eq!(source, "https://cdn.test/a.mp3");
        assert!(!handle);
        assert!(download);
        assert_eq!(output, Some(PathBuf::from("out.mp3")));
    }

    #[test]
    fn test_handle_conflicts_with_download() {
        let result =
            Cli::try_parse_from(["audiostash", "play", "/music/a.mp3", "--handle", "--download"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_subcommands() {
        let cli = Cli::parse_from(["audiostash", "cache", "clear", "--force"]);
        let Some(Commands::Cache { command }) = cli.command else {
            panic!("expected cache command");
        };
        assert_eq!(command, CacheCommand::Clear { force: true });
    }
}
