//! Cache entry and statistics types.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type recorded when the source does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "audio/mpeg";

/// A fully downloaded payload keyed by its source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Source URL; the unique key.
    pub url: String,
    /// Raw bytes exactly as fetched.
    pub payload: Bytes,
    /// When this entry was written.
    pub created_at: DateTime<Utc>,
    /// Length of `payload` in bytes.
    pub byte_size: u64,
    /// MIME type reported by the source (or the default).
    pub content_type: String,
}

impl CacheEntry {
    /// Build an entry stamped with the current time.
    pub fn new(url: impl Into<String>, payload: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            byte_size: payload.len() as u64,
            payload,
            created_at: Utc::now(),
            content_type: content_type.into(),
        }
    }
}

/// Diagnostics summary of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of cached entries.
    pub count: u64,
    /// Sum of `byte_size` over all entries.
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_size_tracks_payload() {
        let entry = CacheEntry::new("https://x/a.mp3", Bytes::from_static(b"0123456789"), "audio/mpeg");
        assert_eq!(entry.byte_size, 10);
        assert_eq!(entry.content_type, "audio/mpeg");
    }

    #[test]
    fn test_stats_wire_shape() {
        let stats = CacheStats {
            count: 2,
            total_bytes: 30,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["totalBytes"], 30);
    }
}
