//! Playback source resolution.
//!
//! Turns a `SourceDescriptor` into something a media element can play without
//! ever downloading: a cache hit becomes a `PlayableHandle`, a miss is reported
//! as `ResolvedSource::NotCached` so the caller can offer an explicit download.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::playback::{
    HandleId, PlayableHandle, Playability, PlaybackError, ResolvedSource, SourceDescriptor,
};
use crate::ports::{BlobStorePort, LocalFileAccessPort, PermissionState};

const PERMISSION_REASON: &str = "To play this track, grant read permission first.";

/// Resolves descriptors from the cache and owns the live handle registry.
pub struct PlaybackResolver {
    store: Arc<dyn BlobStorePort>,
    local_files: Arc<dyn LocalFileAccessPort>,
    handles: Mutex<HashMap<HandleId, Bytes>>,
}

impl std::fmt::Debug for PlaybackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackResolver")
            .field("live_handles", &self.live_handle_count())
            .finish_non_exhaustive()
    }
}

impl PlaybackResolver {
    /// Create a resolver over a blob store and a local file access path.
    pub fn new(store: Arc<dyn BlobStorePort>, local_files: Arc<dyn LocalFileAccessPort>) -> Self {
        Self {
            store,
            local_files,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a descriptor into a playable source.
    ///
    /// Never fetches. Storage failures while reading a cached entry are
    /// propagated; a miss is `Ok(ResolvedSource::NotCached)`.
    pub async fn resolve(
        &self,
        descriptor: &SourceDescriptor,
    ) -> Result<ResolvedSource, PlaybackError> {
        match descriptor {
            SourceDescriptor::Remote { url } => self.resolve_remote(url).await,
            SourceDescriptor::LocalFile { path } => self.open_local(path).await,
            SourceDescriptor::FileHandle { path } => {
                if self.ensure_permission(path).await {
                    self.open_local(path).await
                } else {
                    debug!(target: "audiostash.playback", path = %path.display(), "File handle permission not granted");
                    Ok(ResolvedSource::Unavailable {
                        reason: PERMISSION_REASON.to_string(),
                    })
                }
            }
        }
    }

    async fn resolve_remote(&self, url: &str) -> Result<ResolvedSource, PlaybackError> {
        let Some(entry) = self.store.get(url).await? else {
            debug!(target: "audiostash.playback", url = %url, "Cache miss, download required");
            return Ok(ResolvedSource::NotCached {
                url: url.to_string(),
            });
        };

        let handle = PlayableHandle {
            id: HandleId::new(),
            url: entry.url,
            content_type: entry.content_type,
            byte_size: entry.byte_size,
        };
        self.handles.lock().insert(handle.id, entry.payload);
        debug!(
            target: "audiostash.playback",
            url = %url,
            handle = %handle.id,
            bytes = handle.byte_size,
            "Cache hit, handle created"
        );
        Ok(ResolvedSource::Playable(handle))
    }

    async fn open_local(&self, path: &Path) -> Result<ResolvedSource, PlaybackError> {
        self.local_files
            .open(path)
            .await
            .map(ResolvedSource::LocalFile)
            .map_err(PlaybackError::LocalFile)
    }

    /// Query, and when undecided request, read permission.
    async fn ensure_permission(&self, path: &Path) -> bool {
        match self.local_files.query_permission(path).await {
            PermissionState::Granted => true,
            PermissionState::Denied => false,
            PermissionState::Prompt => match self.local_files.request_permission(path).await {
                Ok(state) => state == PermissionState::Granted,
                Err(e) => {
                    // Requests need an interactive user; treat as not granted.
                    debug!(target: "audiostash.playback", error = %e, "Permission request failed");
                    false
                }
            },
        }
    }

    /// Revoke a handle. Returns `false` when it was already released.
    ///
    /// Releasing twice, or releasing a handle superseded by a newer load, is
    /// tolerated as a no-op.
    pub fn release(&self, handle: &PlayableHandle) -> bool {
        let revoked = self.handles.lock().remove(&handle.id).is_some();
        if revoked {
            debug!(target: "audiostash.playback", handle = %handle.id, "Handle revoked");
        } else {
            warn!(target: "audiostash.playback", handle = %handle.id, "Ignoring release of unknown handle");
        }
        revoked
    }

    /// Bytes behind a live handle; `None` once released.
    pub fn payload(&self, handle: &PlayableHandle) -> Option<Bytes> {
        self.handles.lock().get(&handle.id).cloned()
    }

    /// Whether the descriptor could start playing now. Side-effect free: no
    /// download, no permission request, no handle.
    pub async fn can_play(&self, descriptor: &SourceDescriptor) -> Playability {
        match descriptor {
            SourceDescriptor::Remote { url } => {
                if self.store.has(url).await {
                    Playability::Ready
                } else {
                    Playability::NeedsDownload { url: url.clone() }
                }
            }
            SourceDescriptor::LocalFile { .. } => Playability::Ready,
            SourceDescriptor::FileHandle { path } => {
                match self.local_files.query_permission(path).await {
                    PermissionState::Denied => Playability::Unavailable {
                        reason: PERMISSION_REASON.to_string(),
                    },
                    PermissionState::Granted | PermissionState::Prompt => Playability::Ready,
                }
            }
        }
    }

    /// Number of handles not yet released.
    pub fn live_handle_count(&self) -> usize {
        self.handles.lock().len()
    }
}
