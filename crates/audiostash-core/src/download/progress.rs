//! Download progress - the observable projection of a download task.
//!
//! A `DownloadProgress` is replaced wholesale on every transition; observers
//! never receive partial patches.

use serde::{Deserialize, Serialize};

use super::types::TrackId;

/// State of a track's download lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Not queued and not downloading (never seen, or cancelled).
    #[default]
    Idle,
    /// Waiting in the pending queue (or for a retry slot).
    Queued,
    /// Bytes are being fetched.
    Downloading,
    /// Payload is durably stored in the blob cache.
    Complete,
    /// Gave up after exhausting retries, or persistence failed.
    Error,
}

impl DownloadState {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// Parse from string representation.
    ///
    /// `pending` is accepted as an alias of `queued`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" | "pending" => Self::Queued,
            "downloading" => Self::Downloading,
            "complete" => Self::Complete,
            "error" => Self::Error,
            _ => Self::Idle,
        }
    }

    /// `complete` and `error` are terminal: no further automatic transition.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// Queued or downloading.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::Queued | Self::Downloading)
    }
}

/// Point-in-time progress of a single track.
///
/// This is the wire contract consumed by download badges and menus:
/// `{trackId, url, state, progressPercent, bytesLoaded, bytesTotal, errorMessage?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    /// Track this progress belongs to.
    pub track_id: TrackId,
    /// Source URL (the cache key).
    pub url: String,
    /// Current lifecycle state.
    pub state: DownloadState,
    /// 0-100; only meaningful while downloading with a known total, 100 on completion.
    pub progress_percent: u8,
    /// Bytes received so far.
    pub bytes_loaded: u64,
    /// Declared total size, 0 when unknown.
    pub bytes_total: u64,
    /// Failure reason, present only in the `error` state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DownloadProgress {
    fn with_state(track_id: TrackId, url: impl Into<String>, state: DownloadState) -> Self {
        Self {
            track_id,
            url: url.into(),
            state,
            progress_percent: 0,
            bytes_loaded: 0,
            bytes_total: 0,
            error_message: None,
        }
    }

    /// Not downloading, no error (used after cancellation).
    pub fn idle(track_id: TrackId, url: impl Into<String>) -> Self {
        Self::with_state(track_id, url, DownloadState::Idle)
    }

    /// Waiting for a download slot.
    pub fn queued(track_id: TrackId, url: impl Into<String>) -> Self {
        Self::with_state(track_id, url, DownloadState::Queued)
    }

    /// Bytes flowing. `bytes_total` is 0 when the source declared no size.
    pub fn downloading(
        track_id: TrackId,
        url: impl Into<String>,
        bytes_loaded: u64,
        bytes_total: u64,
    ) -> Self {
        Self {
            progress_percent: percent_of(bytes_loaded, bytes_total),
            bytes_loaded,
            bytes_total,
            ..Self::with_state(track_id, url, DownloadState::Downloading)
        }
    }

    /// Stored in the cache. `byte_size` is 0 when the entry was already cached.
    pub fn complete(track_id: TrackId, url: impl Into<String>, byte_size: u64) -> Self {
        Self {
            progress_percent: 100,
            bytes_loaded: byte_size,
            bytes_total: byte_size,
            ..Self::with_state(track_id, url, DownloadState::Complete)
        }
    }

    /// Terminal failure with a user-facing message.
    pub fn failed(track_id: TrackId, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::with_state(track_id, url, DownloadState::Error)
        }
    }

    /// Whether this progress is terminal (`complete` or `error`).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Integer percentage of `loaded / total`, clamped to 0-100. Unknown totals report 0.
#[must_use]
pub fn percent_of(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (u128::from(loaded) * 100) / u128::from(total);
    u8::try_from(percent.min(100)).unwrap_or(100)
}
