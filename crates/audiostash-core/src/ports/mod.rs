//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - Storage ports are CRUD-focused; retry and exclusivity live in the manager
//! - A cache miss is a value (`None`/`false`), never an error

pub mod blob_store;
pub mod download_manager;
pub mod fetcher;
pub mod local_file;

use thiserror::Error;

pub use blob_store::BlobStorePort;
pub use download_manager::{DownloadManagerConfig, DownloadManagerPort};
pub use fetcher::{AudioFetcherPort, ByteStream, FetchResponse};
pub use local_file::{FsLocalFileAccess, LocalFile, LocalFileAccessPort, PermissionState};

/// Domain-specific errors for storage operations.
///
/// Abstracts away the backend (e.g., sqlx errors) so services can react to
/// storage failures without knowing where the bytes live.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Database(String),

    /// A stored row could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
