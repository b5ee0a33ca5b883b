//! `SQLite` blob cache for audiostash.
//!
//! Implements `BlobStorePort` on top of sqlx. The pool never leaves this
//! crate's adapters; callers only see the port.
#![deny(unsafe_code)]

pub mod repositories;
pub mod setup;

// Re-export repository implementations
pub use repositories::SqliteBlobStore;

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;

