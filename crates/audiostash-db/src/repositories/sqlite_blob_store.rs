//! `SQLite` implementation of the `BlobStorePort` trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use audiostash_core::{BlobStorePort, CacheEntry, CacheStats, StorageError};

/// `SQLite` implementation of the `BlobStorePort` trait.
///
/// One row per URL. Writes are single-statement upserts, so concurrent
/// downloads of different URLs never interfere and a reader never sees a
/// half-written entry.
#[derive(Debug, Clone)]
pub struct SqliteBlobStore {
    pool: SqlitePool,
}

impl SqliteBlobStore {
    /// Create a new `SQLite` blob store over an initialized pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool (for testing only).
    #[cfg(test)]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl BlobStorePort for SqliteBlobStore {
    async fn has(&self, url: &str) -> bool {
        let result = sqlx::query("SELECT 1 FROM audio_cache WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(row) => row.is_some(),
            Err(e) => {
                warn!(target: "audiostash.cache", url = %url, error = %e, "Cache lookup failed, treating as not cached");
                false
            }
        }
    }

    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT url, payload, created_at, byte_size, content_type
            FROM audio_cache
            WHERE url = ?
            ",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        row.as_ref().map(row_to_cache_entry).transpose()
    }

    async fn put(
        &self,
        url: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let byte_size = i64::try_from(payload.len())
            .map_err(|_| StorageError::Serialization(format!("payload too large for {url}")))?;

        sqlx::query(
            r"
            INSERT INTO audio_cache (url, payload, created_at, byte_size, content_type)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                payload = excluded.payload,
                created_at = excluded.created_at,
                byte_size = excluded.byte_size,
                content_type = excluded.content_type
            ",
        )
        .bind(url)
        .bind(payload.as_ref())
        .bind(Utc::now())
        .bind(byte_size)
        .bind(content_type)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!(target: "audiostash.cache", url = %url, bytes = byte_size, "Stored cache entry");
        Ok(())
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM audio_cache WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM audio_cache")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!(target: "audiostash.cache", removed = result.rows_affected(), "Cleared cache");
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, StorageError> {
        let (count, total_bytes): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(byte_size), 0) FROM audio_cache")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(CacheStats {
            count: u64::try_from(count).unwrap_or_default(),
            total_bytes: u64::try_from(total_bytes).unwrap_or_default(),
        })
    }

    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        sqlx::query_scalar::<_, String>("SELECT url FROM audio_cache ORDER BY created_at ASC, url ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}

/// Convert a database row to a `CacheEntry`.
fn row_to_cache_entry(row: &sqlx::sqlite::SqliteRow) -> Result<CacheEntry, StorageError> {
    use sqlx::Row;

    let url: String = row.try_get("url").map_err(map_column_error)?;
    let payload: Vec<u8> = row.try_get("payload").map_err(map_column_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(map_column_error)?;
    let byte_size: i64 = row.try_get("byte_size").map_err(map_column_error)?;
    let content_type: String = row.try_get("content_type").map_err(map_column_error)?;

    let byte_size = u64::try_from(byte_size)
        .map_err(|_| StorageError::Serialization(format!("negative byte_size for {url}")))?;

    Ok(CacheEntry {
        url,
        payload: Bytes::from(payload),
        created_at,
        byte_size,
        content_type,
    })
}

fn map_column_error(e: sqlx::Error) -> StorageError {
    StorageError::Serialization(e.to_string())
}
