//! In-process blob store.
//!
//! Holds entries in memory only. Used by tests across the workspace and for
//! throwaway sessions where nothing should touch disk.

use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{CacheEntry, CacheStats};
use crate::ports::{BlobStorePort, StorageError};

/// `BlobStorePort` backed by an insertion-ordered map.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: RwLock<IndexMap<String, CacheEntry>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStorePort for MemoryBlobStore {
    async fn has(&self, url: &str) -> bool {
        self.entries.read().contains_key(url)
    }

    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, StorageError> {
        Ok(self.entries.read().get(url).cloned())
    }

    async fn put(
        &self,
        url: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let entry = CacheEntry::new(url, payload, content_type);
        self.entries.write().insert(url.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        self.entries.write().shift_remove(url);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.write().clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, StorageError> {
        let entries = self.entries.read();
        Ok(CacheStats {
            count: entries.len() as u64,
            total_bytes: entries.values().map(|e| e.byte_size).sum(),
        })
    }

    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
