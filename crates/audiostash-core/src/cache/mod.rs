//! Blob cache domain types.
//!
//! The cache is a persistent `url -> payload` map. Entries are immutable once
//! written; a second write for the same URL replaces the first wholesale.

mod memory;
mod types;

pub use memory::MemoryBlobStore;
pub use types::{CacheEntry, CacheStats, DEFAULT_CONTENT_TYPE};
