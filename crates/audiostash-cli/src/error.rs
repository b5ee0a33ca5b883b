//! CLI-specific error types and exit codes.

use thiserror::Error;

use audiostash_core::{PathError, PlaybackError, SettingsError, StorageError};

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument combination rejected after parsing.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Settings or path configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache database error.
    #[error("Database error: {0}")]
    Database(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// One or more downloads ended in the error state.
    #[error("Download failed: {0}")]
    Download(String),

    /// The requested remote source is not in the offline cache.
    #[error("'{0}' is not cached. Re-run with --download to fetch it first.")]
    NotCached(String),

    /// A local source cannot be read.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Interrupted by the user.
    #[error("Interrupted")]
    Interrupted,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where a category fits.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            Self::Download(_) | Self::NotCached(_) => 1,
            Self::Unavailable(_) => 66, // EX_NOINPUT
            Self::Database(_) => 73,    // EX_CANTCREAT
            Self::Io(_) => 74,          // EX_IOERR
            Self::Config(_) => 78,      // EX_CONFIG
            Self::Interrupted => 130,
        }
    }

    /// Exit code for an arbitrary handler error.
    pub fn exit_code_for(err: &anyhow::Error) -> u8 {
        err.downcast_ref::<Self>().map_or(1, Self::exit_code)
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PlaybackError> for CliError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Storage(e) => e.into(),
            PlaybackError::LocalFile(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
