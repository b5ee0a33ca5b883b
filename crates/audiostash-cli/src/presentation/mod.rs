//! Terminal presentation helpers.

mod progress;

pub use progress::DownloadBars;

use audiostash_core::Playability;

/// One-word label for a playability answer.
pub const fn playability_label(playability: &Playability) -> &'static str {
    match playability {
        Playability::Ready => "ready",
        Playability::NeedsDownload { .. } => "needs download",
        Playability::Unavailable { .. } => "unavailable",
    }
}
