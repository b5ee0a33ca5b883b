//! Blob cache port definition.
//!
//! The blob store is pure storage: it has no network awareness and performs
//! no exclusivity beyond what the backend guarantees for a single key.

use async_trait::async_trait;
use bytes::Bytes;

use super::StorageError;
use crate::cache::{CacheEntry, CacheStats};

/// Persistent `url -> payload` map.
///
/// # Contract
///
/// - `has` never fails: a backend error reads as "not cached" so callers fall
///   back to downloading.
/// - `get` reports a missing key as `Ok(None)`.
/// - `put` is overwrite-or-create and propagates failures; a download must not
///   be reported as complete when its payload was not persisted.
/// - `remove` and `clear` are idempotent.
#[async_trait]
pub trait BlobStorePort: Send + Sync {
    /// Whether an entry exists for `url`. Fails closed.
    async fn has(&self, url: &str) -> bool;

    /// Fetch the entry for `url`, if any.
    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, StorageError>;

    /// Store `payload` under `url`, replacing any previous entry.
    async fn put(&self, url: &str, payload: Bytes, content_type: &str)
    -> Result<(), StorageError>;

    /// Delete the entry for `url`. No-op when absent.
    async fn remove(&self, url: &str) -> Result<(), StorageError>;

    /// Delete every entry.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Entry count and total payload bytes.
    async fn stats(&self) -> Result<CacheStats, StorageError>;

    /// All cached URLs.
    async fn list_keys(&self) -> Result<Vec<String>, StorageError>;
}
