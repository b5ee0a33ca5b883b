//! Data root resolution.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "AUDIOSTASH_DATA_DIR";

/// Get the root directory for application data.
///
/// Resolution order:
/// 1. `AUDIOSTASH_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/audiostash`)
///
/// The directory is created if it doesn't exist.
pub fn data_root() -> Result<PathBuf, PathError> {
    let override_dir = env::var(DATA_DIR_ENV).ok();
    let root = resolve_data_root(override_dir.as_deref(), dirs::data_local_dir())?;
    ensure_directory(&root)?;
    Ok(root)
}

/// Pure data root resolution: a non-blank override wins, otherwise
/// `<system_data_dir>/audiostash`.
pub fn resolve_data_root(
    override_dir: Option<&str>,
    system_data_dir: Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    match override_dir.map(str::trim) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => system_data_dir
            .map(|dir| dir.join("audiostash"))
            .ok_or(PathError::NoDataDir),
    }
}

/// Create `path` (and parents) if missing; fail if it exists as a file.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
