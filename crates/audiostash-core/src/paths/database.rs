//! Database path resolution.
//!
//! Provides the canonical path to the audiostash `SQLite` blob cache.

use std::env;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::{data_root, ensure_directory};

/// Environment variable overriding the database file location.
pub const DB_PATH_ENV: &str = "AUDIOSTASH_DB_PATH";

/// File name of the blob cache inside the data root.
pub const DATABASE_FILE_NAME: &str = "audiostash.db";

/// Get the path to the blob cache database.
///
/// `AUDIOSTASH_DB_PATH` wins; otherwise `audiostash.db` in the data root. The
/// parent directory is created if it doesn't exist.
pub fn database_path() -> Result<PathBuf, PathError> {
    let override_path = env::var(DB_PATH_ENV).ok();
    let path = match override_path.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => resolve_database_path(Some(p), Path::new(""))?,
        _ => resolve_database_path(None, &data_root()?)?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    Ok(path)
}

/// Pure database path resolution.
pub fn resolve_database_path(
    override_path: Option<&str>,
    data_root: &Path,
) -> Result<PathBuf, PathError> {
    match override_path.map(str::trim) {
        Some("") => Err(PathError::EmptyPath),
        Some(p) => Ok(PathBuf::from(p)),
        None => Ok(data_root.join(DATABASE_FILE_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_in_data_root() {
        let path = resolve_database_path(None, Path::new("/data/audiostash")).unwrap();
        assert_eq!(path, PathBuf::from("/data/audiostash/audiostash.db"));
    }

    #[test]
    fn test_database_path_override() {
        let path = resolve_database_path(Some("/tmp/cache.db"), Path::new("/ignored")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/cache.db"));
        assert!(matches!(
            resolve_database_path(Some(" "), Path::new("/ignored")),
            Err(PathError::EmptyPath)
        ));
    }
}
