//! Download manager port definition.
//!
//! This port is the public face of the download queue. It hides cancellation
//! tokens, leases and worker tasks behind a small synchronous API plus one
//! awaitable helper.
//!
//! # Design
//!
//! - `enqueue`, `cancel` and the snapshot reads are synchronous: queue
//!   membership is decided before they return, so two enqueues for the same
//!   track can never both start a fetch
//! - Observers attach through `subscribe` and detach by dropping the returned
//!   `Subscription`

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::DEFAULT_CONTENT_TYPE;
use crate::download::{DownloadProgress, TrackId};
use crate::events::{ProgressCallback, Subscription};
use crate::settings::PipelineSettings;

/// Default number of downloads allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Default number of retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default pause before a failed attempt is re-queued.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default bound on a single attempt (request plus full body).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Default minimum spacing of byte-level progress events.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for creating a download manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadManagerConfig {
    /// Maximum downloads in the `downloading` state at once (at least 1).
    pub max_concurrent: usize,
    /// Retries after the first attempt; a task makes at most `max_retries + 1` fetches.
    pub max_retries: u32,
    /// Delay before a failed task re-enters the queue.
    pub retry_delay: Duration,
    /// Bound on one fetch attempt.
    pub fetch_timeout: Duration,
    /// Minimum spacing of byte-level progress events.
    pub progress_interval: Duration,
    /// Content type stored when the source declares none.
    pub default_content_type: String,
}

impl Default for DownloadManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl DownloadManagerConfig {
    /// Resolve a config from (already validated) settings.
    #[must_use]
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            max_concurrent: settings.effective_max_concurrent(),
            max_retries: settings.effective_max_retries(),
            retry_delay: settings.effective_retry_delay(),
            fetch_timeout: settings.effective_fetch_timeout(),
            progress_interval: settings.effective_progress_interval(),
            default_content_type: settings.effective_default_content_type().to_string(),
        }
    }

    /// Set the maximum concurrent downloads. Zero is raised to one.
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the delay before a retry.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the progress event spacing.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Port for managing downloads.
///
/// # Usage
///
/// ```ignore
/// let manager: Arc<dyn DownloadManagerPort> = /* ... */;
///
/// let _sub = manager.subscribe(Arc::new(|p| println!("{} {:?}", p.track_id, p.state)));
/// manager.enqueue(TrackId::new("t1"), "https://cdn.example/t1.mp3");
///
/// // Later
/// manager.cancel(&TrackId::new("t1"));
/// ```
#[async_trait]
pub trait DownloadManagerPort: Send + Sync {
    /// Add a download to the tail of the queue.
    ///
    /// Returns `false` (and does nothing) when the track is already queued,
    /// waiting for a retry, or downloading. Emits `queued` immediately otherwise.
    fn enqueue(&self, track_id: TrackId, url: &str) -> bool;

    /// Stop a track's download wherever it is. Returns whether anything was cancelled.
    fn cancel(&self, track_id: &TrackId) -> bool;

    /// Cancel every active, pending and retry-waiting download.
    fn cancel_all(&self);

    /// Register an observer of every progress change across all tracks.
    ///
    /// Callbacks run synchronously on the thread that delivers the event, in
    /// publish order. When another thread is already delivering, a call such
    /// as `enqueue` can return before its own event reaches observers; that
    /// thread delivers it next.
    fn subscribe(&self, callback: ProgressCallback) -> Subscription;

    /// Latest progress for a track, if the manager has seen it.
    fn get_progress(&self, track_id: &TrackId) -> Option<DownloadProgress>;

    /// Latest progress for every track the manager has seen.
    fn get_all_progress(&self) -> Vec<DownloadProgress>;

    /// Whether the track is queued, waiting for a retry, or in flight.
    fn is_downloading(&self, track_id: &TrackId) -> bool;

    /// Enqueue (if needed) and wait for the track's next terminal outcome.
    ///
    /// Resolves with `complete`, `error`, or `idle` when cancelled.
    async fn download_and_wait(&self, track_id: TrackId, url: &str) -> DownloadProgress;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownloadManagerConfig::default();
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert_eq!(config.default_content_type, "audio/mpeg");
    }

    #[test]
    fn test_builder_clamps_concurrency() {
        let config = DownloadManagerConfig::default()
            .with_max_concurrent(0)
            .with_max_retries(5)
            .with_retry_delay(Duration::from_millis(10));
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_from_settings() {
        let settings = PipelineSettings {
            max_concurrent: Some(4),
            retry_delay_ms: Some(250),
            ..Default::default()
        };
        let config = DownloadManagerConfig::from_settings(&settings);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.retry_delay, Duration::from_millis(250));
    }
}
