//! Local file access port.
//!
//! Local files never touch the download pipeline; the playback resolver hands
//! them through after the permission dance.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Read permission state for a user-granted file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Readable.
    Granted,
    /// Not yet decided; a request may succeed.
    Prompt,
    /// Refused; only re-authorization helps.
    Denied,
}

/// An opened local audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Path of the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub byte_size: u64,
}

/// Access to files chosen by the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalFileAccessPort: Send + Sync {
    /// Current read permission for `path`.
    async fn query_permission(&self, path: &Path) -> PermissionState;

    /// Ask for read permission. Fails when no user is around to answer.
    async fn request_permission(&self, path: &Path) -> Result<PermissionState, String>;

    /// Open `path` for playback.
    async fn open(&self, path: &Path) -> Result<LocalFile, String>;
}

/// Plain filesystem access: permission is whatever the OS says about the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLocalFileAccess;

#[async_trait]
impl LocalFileAccessPort for FsLocalFileAccess {
    async fn query_permission(&self, path: &Path) -> PermissionState {
        match tokio::fs::File::open(path).await {
            Ok(_) => PermissionState::Granted,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => PermissionState::Denied,
            Err(_) => PermissionState::Prompt,
        }
    }

    async fn request_permission(&self, path: &Path) -> Result<PermissionState, String> {
        // Nothing to ask on a plain filesystem; re-check instead.
        Ok(self.query_permission(path).await)
    }

    async fn open(&self, path: &Path) -> Result<LocalFile, String> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| format!("{}: {e}", path.display()))?;
        if !metadata.is_file() {
            return Err(format!("{} is not a file", path.display()));
        }
        Ok(LocalFile {
            path: path.to_path_buf(),
            byte_size: metadata.len(),
        })
    }
}
