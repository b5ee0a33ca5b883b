//! Download queue for audiostash.
//!
//! Fetches remote audio in full, under a global concurrency cap, with bounded
//! retries and live progress, and writes each payload into the blob cache
//! before reporting it complete.
//!
//! # Modules
//!
//! - `queue` - pure pending/retry-wait state machine
//! - `manager` - `DownloadManagerImpl`, the `DownloadManagerPort` implementation
//! - `progress` - progress event throttling
//! - `fetch` - `ReqwestFetcher`, the HTTP implementation of `AudioFetcherPort`

// Re-export core types for convenience
pub use audiostash_core::download::{DownloadError, DownloadProgress, DownloadState, TrackId};
pub use audiostash_core::ports::{
    AudioFetcherPort, BlobStorePort, DownloadManagerConfig, DownloadManagerPort,
};

// Internal modules (pub(crate) to keep implementation private)
pub(crate) mod progress;
pub(crate) mod queue;

// Re-export progress throttle for consumers (adapters)
pub use progress::ProgressThrottle;

// HTTP fetcher
mod fetch;
pub use fetch::ReqwestFetcher;

// Public API - download manager
mod manager;

pub use manager::{DownloadManagerDeps, DownloadManagerImpl, build_download_manager};
