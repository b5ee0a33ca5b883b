//! Queue item types (internal implementation).

use std::time::Instant;

use audiostash_core::download::TrackId;

/// A download waiting for a slot, or waiting out its retry delay.
#[derive(Clone, Debug)]
pub struct QueuedTask {
    /// Track being downloaded.
    pub track_id: TrackId,
    /// Source URL, also the cache key.
    pub url: String,
    /// Failed attempts so far.
    pub retry_count: u32,
    /// When this attempt entered the queue.
    pub queued_at: Instant,
}

impl QueuedTask {
    /// Create a fresh task with no attempts behind it.
    pub fn new(track_id: TrackId, url: impl Into<String>) -> Self {
        Self {
            track_id,
            url: url.into(),
            retry_count: 0,
            queued_at: Instant::now(),
        }
    }

    /// The same task after one more failed attempt.
    #[must_use]
    pub fn next_attempt(self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            queued_at: Instant::now(),
            ..self
        }
    }
}
