//! Playback source descriptors and revocable handles.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::LocalFile;

/// Where a track's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// A file the user picked directly; readable without a permission check.
    LocalFile {
        /// Path of the file.
        path: PathBuf,
    },
    /// A persisted file handle whose read permission must be confirmed.
    FileHandle {
        /// Path the handle refers to.
        path: PathBuf,
    },
    /// Remote audio; playable only once fully cached.
    Remote {
        /// Source URL (the cache key).
        url: String,
    },
}

impl SourceDescriptor {
    /// Descriptor for a remote URL.
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote { url: url.into() }
    }

    /// The cache key, for remote descriptors.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::Remote { url } => Some(url),
            Self::LocalFile { .. } | Self::FileHandle { .. } => None,
        }
    }
}

/// Identity of a playable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:audiostash/{}", self.0)
    }
}

/// Revocable reference to cached bytes, suitable for a media element.
///
/// The handle itself carries no bytes; they stay registered with the resolver
/// that issued it until the handle is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableHandle {
    /// Registry key; displayed as a `blob:` style reference.
    pub id: HandleId,
    /// URL the bytes were cached under.
    pub url: String,
    /// Cached content type.
    pub content_type: String,
    /// Cached payload size.
    pub byte_size: u64,
}

impl PlayableHandle {
    /// `blob:` style reference for the media element.
    #[must_use]
    pub fn object_url(&self) -> String {
        self.id.to_string()
    }
}

/// Outcome of resolving a source descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// Cache hit: ready to play. Must be released by the owner.
    Playable(PlayableHandle),
    /// Cache miss: the caller should offer an explicit download.
    NotCached {
        /// URL to download.
        url: String,
    },
    /// A local file, handed through unchanged.
    LocalFile(LocalFile),
    /// Local file without read permission (or otherwise unreadable).
    Unavailable {
        /// Why playback cannot start.
        reason: String,
    },
}

/// Side-effect-free answer to "can this play right now?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Playability {
    /// Cached remote audio or a permitted local file.
    Ready,
    /// Remote audio that has to be downloaded first.
    NeedsDownload {
        /// URL to download.
        url: String,
    },
    /// Local file that cannot be read.
    Unavailable {
        /// Why playback cannot start.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_ids_are_unique_blob_refs() {
        let a = HandleId::new();
        let b = HandleId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("blob:audiostash/"));
    }

    #[test]
    fn test_descriptor_wire_format() {
        let descriptor = SourceDescriptor::remote("https://x/a.mp3");
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "remote");
        assert_eq!(json["url"], "https://x/a.mp3");
        assert_eq!(descriptor.remote_url(), Some("https://x/a.mp3"));

        let local = SourceDescriptor::FileHandle {
            path: PathBuf::from("/music/a.flac"),
        };
        assert_eq!(local.remote_url(), None);
    }
}
