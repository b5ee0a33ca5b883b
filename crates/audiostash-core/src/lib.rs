//! Core domain types, ports and services for the audiostash download-first
//! media cache.
//!
//! Remote audio is never streamed: it is downloaded in full into a blob cache
//! keyed by source URL, and only then handed to playback. This crate holds
//! the pieces every adapter shares:
//!
//! - [`cache`] - cache entries, statistics and an in-process store
//! - [`download`] - track identity, progress snapshots, download errors
//! - [`events`] - the progress broadcast registry
//! - [`playback`] - source descriptors and revocable playable handles
//! - [`ports`] - blob store, fetcher, local file and download manager traits
//! - [`services`] - playback resolver, playback session, download status view
//! - [`settings`] / [`paths`] - configuration and data locations
#![deny(unused_crate_dependencies)]

pub mod cache;
pub mod download;
pub mod events;
pub mod paths;
pub mod playback;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use cache::{CacheEntry, CacheStats, DEFAULT_CONTENT_TYPE, MemoryBlobStore};
pub use download::{DownloadError, DownloadProgress, DownloadResult, DownloadState, TrackId};
pub use events::{ProgressBroadcast, ProgressCallback, Subscription};
pub use paths::{PathError, data_root, database_path};
pub use playback::{
    HandleId, PlayableHandle, Playability, PlaybackError, ResolvedSource, SourceDescriptor,
};
pub use ports::{
    AudioFetcherPort, BlobStorePort, ByteStream, DownloadManagerConfig, DownloadManagerPort,
    FetchResponse, FsLocalFileAccess, LocalFile, LocalFileAccessPort, PermissionState,
    StorageError,
};
pub use services::{DownloadStatusStore, PlaybackResolver, PlaybackSession};
pub use settings::{PipelineSettings, SettingsError, validate_settings};
