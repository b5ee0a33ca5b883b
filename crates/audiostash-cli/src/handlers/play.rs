//! Play command handler.
//!
//! Resolves a source the way a player would before starting playback. Remote
//! audio is only ever played from the cache; with `--download` a miss is
//! fetched in full first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use indicatif::HumanBytes;

use audiostash_core::{
    DownloadProgress, DownloadState, PlaybackSession, ResolvedSource, TrackId,
};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::DownloadBars;
use crate::utils::source::parse_source;

/// Arguments for the play command.
#[derive(Debug, Clone)]
pub struct PlayArgs {
    /// URL or local path.
    pub source: String,
    /// Treat a local path as a persisted file handle.
    pub handle: bool,
    /// Download remote audio that is not cached yet.
    pub download: bool,
    /// Write the resolved audio here.
    pub output: Option<PathBuf>,
}

/// Execute the play command.
pub async fn execute(ctx: &CliContext, args: PlayArgs) -> Result<()> {
    let descriptor = parse_source(&args.source, args.handle);
    let mut session = PlaybackSession::new(Arc::clone(&ctx.resolver));

    let mut resolved = session.load(&descriptor).await.map_err(CliError::from)?;
    if let ResolvedSource::NotCached { url } = &resolved {
        let url = url.clone();
        if !args.download {
            return Err(CliError::NotCached(url).into());
        }
        fetch(ctx, &url).await?;
        resolved = session.load(&descriptor).await.map_err(CliError::from)?;
    }

    let result = present(&session, &resolved, args.output.as_deref()).await;
    session.stop();
    result
}

async fn fetch(ctx: &CliContext, url: &str) -> Result<()> {
    let track_id = TrackId::new(url);
    let bars = Arc::new(DownloadBars::new());
    bars.add(&track_id, url);

    let sink = Arc::clone(&bars);
    let _subscription = ctx
        .downloads
        .subscribe(Arc::new(move |progress: &DownloadProgress| sink.update(progress)));

    let outcome = ctx.downloads.download_and_wait(track_id, url).await;
    match outcome.state {
        DownloadState::Complete => Ok(()),
        _ => Err(CliError::Download(
            outcome
                .error_message
                .unwrap_or_else(|| format!("download of '{url}' was cancelled")),
        )
        .into()),
    }
}

async fn present(
    session: &PlaybackSession,
    resolved: &ResolvedSource,
    output: Option<&Path>,
) -> Result<()> {
    match resolved {
        ResolvedSource::Playable(handle) => {
            println!("Ready to play {}", handle.url);
            println!("  handle:       {}", handle.object_url());
            println!("  content type: {}", handle.content_type);
            println!("  size:         {}", HumanBytes(handle.byte_size));
            if let Some(output) = output {
                let payload = session.current_payload().ok_or_else(|| {
                    CliError::Unavailable(format!("handle for '{}' was released", handle.url))
                })?;
                tokio::fs::write(output, &payload)
                    .await
                    .map_err(|e| CliError::Io(format!("{}: {e}", output.display())))?;
                println!("  written to:   {}", output.display());
            }
            Ok(())
        }
        ResolvedSource::LocalFile(file) => {
            println!("Ready to play {}", file.path.display());
            println!("  size:         {}", HumanBytes(file.byte_size));
            if let Some(output) = output {
                tokio::fs::copy(&file.path, output)
                    .await
                    .map_err(|e| CliError::Io(format!("{}: {e}", output.display())))?;
                println!("  written to:   {}", output.display());
            }
            Ok(())
        }
        ResolvedSource::NotCached { url } => Err(CliError::NotCached(url.clone()).into()),
        ResolvedSource::Unavailable { reason } => Err(CliError::Unavailable(reason.clone()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use audiostash_core::{BlobStorePort, FsLocalFileAccess, MemoryBlobStore, PlaybackResolver};
    use audiostash_download::{DownloadManagerDeps, ReqwestFetcher, build_download_manager};
    use bytes::Bytes;

    const URL: &str = "https://cdn.test/cached.mp3";

    async fn context() -> CliContext {
        let store: Arc<dyn BlobStorePort> = Arc::new(MemoryBlobStore::new());
        store
            .put(URL, Bytes::from_static(b"cached audio"), "audio/ogg")
            .await
            .unwrap();
        let downloads = build_download_manager(DownloadManagerDeps {
            store: Arc::clone(&store),
            fetcher: Arc::new(ReqwestFetcher::new().unwrap()),
            config: audiostash_core::DownloadManagerConfig::default(),
        });
        let resolver = Arc::new(PlaybackResolver::new(
            Arc::clone(&store),
            Arc::new(FsLocalFileAccess),
        ));
        CliContext {
            store,
            downloads,
            resolver,
            db_path: PathBuf::from("unused.db"),
        }
    }

    fn args(source: &str) -> PlayArgs {
        PlayArgs {
            source: source.to_string(),
            handle: false,
            download: false,
            output: None,
        }
    }

    #[tokio::test]
    async fn test_cached_source_is_written_and_released() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.ogg");

        let mut play = args(URL);
        play.output = Some(output.clone());
        execute(&ctx, play).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"cached audio");
        assert_eq!(ctx.resolver.live_handle_count(), 0);
    }

    #[tokio::test]
    async fn test_miss_without_download_is_not_cached() {
        let ctx = context().await;
        let err = execute(&ctx, args("https://cdn.test/missing.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::NotCached(url)) if url == "https://cdn.test/missing.mp3"
        ));
    }

    #[tokio::test]
    async fn test_local_file_is_handed_through() {
        let ctx = context().await;
        let dir = tempfile::tempdir().unwrap();
        let track = dir.path().join("local.mp3");
        std::fs::write(&track, b"local bytes").unwrap();
        let output = dir.path().join("copy.mp3");

        let mut play = args(track.to_str().unwrap());
        play.output = Some(output.clone());
        execute(&ctx, play).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"local bytes");
    }
}
