//! Download domain types, progress snapshots and errors.
//!
//! This module contains pure data types for the download pipeline. No I/O,
//! networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Track identity (`TrackId`)
//! - `progress` - Observable per-track state (`DownloadState`, `DownloadProgress`)
//! - `errors` - Error taxonomy for fetch and persistence failures

pub mod errors;
pub mod progress;
pub mod types;

pub use errors::{DownloadError, DownloadResult};
pub use progress::{DownloadProgress, DownloadState};
pub use types::TrackId;
