//! Playback error types.

use thiserror::Error;

use crate::ports::StorageError;

/// Unexpected failures while resolving a playback source.
///
/// A cache miss or a denied permission is not an error; those are reported
/// as `ResolvedSource` values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// The blob store failed while reading a cached entry.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A permitted local file could not be opened.
    #[error("Local file error: {0}")]
    LocalFile(String),
}
