//! Core services - orchestration over the ports.
//!
//! Services here are pure orchestrators; they never know which store or
//! fetcher implementation sits behind a port.

mod download_status;
mod playback_resolver;
mod playback_session;

pub use download_status::DownloadStatusStore;
pub use playback_resolver::PlaybackResolver;
pub use playback_session::PlaybackSession;
