//! Single owner of the currently loaded playable handle.
//!
//! A media element plays at most one source at a time; the session makes sure
//! the handle behind it is released exactly when the element stops using it:
//! on the next load, on stop, and on playback failure.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::PlaybackResolver;
use crate::playback::{PlayableHandle, PlaybackError, ResolvedSource, SourceDescriptor};

/// Tracks the handle assigned to one media element.
#[derive(Debug)]
pub struct PlaybackSession {
    resolver: Arc<PlaybackResolver>,
    current: Option<PlayableHandle>,
}

impl PlaybackSession {
    /// Create an empty session.
    pub const fn new(resolver: Arc<PlaybackResolver>) -> Self {
        Self {
            resolver,
            current: None,
        }
    }

    /// Load a new source, releasing the previous handle first.
    ///
    /// When the result is `Playable`, the session owns the new handle.
    pub async fn load(
        &mut self,
        descriptor: &SourceDescriptor,
    ) -> Result<ResolvedSource, PlaybackError> {
        self.release_current();

        let resolved = self.resolver.resolve(descriptor).await?;
        if let ResolvedSource::Playable(handle) = &resolved {
            debug!(target: "audiostash.playback", handle = %handle.id, url = %handle.url, "Session loaded handle");
            self.current = Some(handle.clone());
        }
        Ok(resolved)
    }

    /// Playback ended or was stopped.
    pub fn stop(&mut self) {
        self.release_current();
    }

    /// The media element reported an error.
    pub fn fail(&mut self) {
        if let Some(handle) = &self.current {
            debug!(target: "audiostash.playback", handle = %handle.id, "Playback failed, releasing handle");
        }
        self.release_current();
    }

    /// Handle currently assigned to the media element.
    pub const fn current(&self) -> Option<&PlayableHandle> {
        self.current.as_ref()
    }

    /// Bytes of the current handle.
    pub fn current_payload(&self) -> Option<Bytes> {
        self.current
            .as_ref()
            .and_then(|handle| self.resolver.payload(handle))
    }

    fn release_current(&mut self) {
        if let Some(handle) = self.current.take() {
            self.resolver.release(&handle);
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.release_current();
    }
}
