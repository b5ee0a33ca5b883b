//! Path utilities for audiostash data directories.
//!
//! This module provides the canonical location of the blob cache database.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - Environment lookups happen in thin wrappers; the `resolve_*` functions
//!   are pure so they can be tested without touching the process environment

mod database;
mod error;
mod platform;

pub use database::{DB_PATH_ENV, DATABASE_FILE_NAME, database_path, resolve_database_path};
pub use error::PathError;
pub use platform::{DATA_DIR_ENV, data_root, ensure_directory, resolve_data_root};
