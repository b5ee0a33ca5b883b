//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - `SQLite` pool and blob store (via audiostash-db)
//! - HTTP fetcher and download manager (via audiostash-download)
//! - Playback resolver (via audiostash-core)
//!
//! Command handlers receive the composed `CliContext` and never open the
//! database themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use audiostash_core::paths::{database_path, resolve_database_path};
use audiostash_core::{
    BlobStorePort, DownloadManagerConfig, DownloadManagerPort, FsLocalFileAccess,
    PipelineSettings, PlaybackResolver, validate_settings,
};
use audiostash_db::{SqliteBlobStore, setup_database};
use audiostash_download::{DownloadManagerDeps, ReqwestFetcher, build_download_manager};

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Cache database file.
    pub db_path: PathBuf,
    /// Validated pipeline settings.
    pub settings: PipelineSettings,
}

impl CliConfig {
    /// Resolve paths and settings from parsed arguments.
    ///
    /// Flags override environment, which overrides the built-in defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut settings = PipelineSettings::with_defaults();
        settings.merge(&cli.settings_overrides());
        validate_settings(&settings)?;

        let db_path = match cli.db_path.as_deref() {
            Some(path) => resolve_database_path(Some(path), Path::new("."))?,
            None => database_path()?,
        };

        Ok(Self { db_path, settings })
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// Offline audio cache.
    pub store: Arc<dyn BlobStorePort>,
    /// Download queue.
    pub downloads: Arc<dyn DownloadManagerPort>,
    /// Playback source resolver.
    pub resolver: Arc<PlaybackResolver>,
    /// Database file backing the cache.
    pub db_path: PathBuf,
}

impl std::fmt::Debug for CliContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliContext")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

/// Wire the CLI's infrastructure.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let pool = setup_database(&config.db_path)
        .await
        .map_err(|e| CliError::Database(format!("{e:#}")))?;
    let store: Arc<dyn BlobStorePort> = Arc::new(SqliteBlobStore::new(pool));

    let fetcher = ReqwestFetcher::new().map_err(|e| CliError::Config(e.to_string()))?;
    let downloads = build_download_manager(DownloadManagerDeps {
        store: Arc::clone(&store),
        fetcher: Arc::new(fetcher),
        config: DownloadManagerConfig::from_settings(&config.settings),
    });

    let resolver = Arc::new(PlaybackResolver::new(
        Arc::clone(&store),
        Arc::new(FsLocalFileAccess),
    ));

    tracing::debug!(db_path = %config.db_path.display(), "CLI context ready");

    Ok(CliContext {
        store,
        downloads,
        resolver,
        db_path: config.db_path,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from([
            "audiostash",
            "--db-path",
            "/tmp/audiostash-test.db",
            "--max-concurrent",
            "3",
            "paths",
        ]);
        let config = CliConfig::from_cli(&cli).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/audiostash-test.db"));
        assert_eq!(config.settings.max_concurrent, Some(3));
        assert_eq!(config.settings.max_retries, Some(2));
    }

    #[test]
    fn test_config_rejects_invalid_settings() {
        let cli = Cli::parse_from(["audiostash", "--max-concurrent", "0", "paths"]);
        let err = CliConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn test_bootstrap_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("cache.db");
        let config = CliConfig {
            db_path: db_path.clone(),
            settings: PipelineSettings::with_defaults(),
        };

        let ctx = bootstrap(config).await.unwrap();
        assert!(db_path.exists());
        assert_eq!(ctx.store.stats().await.unwrap().count, 0);
    }
}
