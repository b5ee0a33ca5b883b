//! Download command handler.
//!
//! Enqueues every URL, draws one progress bar per track, and waits for all
//! of them to settle. Ctrl-C cancels whatever is still queued or in flight.

use std::sync::Arc;

use anyhow::Result;
use futures_util::future::join_all;

use audiostash_core::{DownloadProgress, DownloadState, DownloadStatusStore, TrackId};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::DownloadBars;

/// Arguments for the download command.
#[derive(Debug, Clone)]
pub struct DownloadArgs {
    /// Source URLs.
    pub urls: Vec<String>,
    /// Explicit track id (single URL only).
    pub track_id: Option<String>,
}

impl DownloadArgs {
    /// Pair every URL with the track id its progress is reported under.
    pub fn jobs(&self) -> Result<Vec<(TrackId, String)>, CliError> {
        match (&self.track_id, self.urls.as_slice()) {
            (Some(id), [url]) => Ok(vec![(TrackId::new(id.as_str()), url.clone())]),
            (Some(_), _) => Err(CliError::Arguments(
                "--track-id can only be used with a single URL".to_string(),
            )),
            (None, urls) => Ok(urls
                .iter()
                .map(|url| (TrackId::new(url.as_str()), url.clone()))
                .collect()),
        }
    }
}

/// Execute the download command.
pub async fn execute(ctx: &CliContext, args: DownloadArgs) -> Result<()> {
    let jobs = args.jobs()?;

    let status = DownloadStatusStore::new(&*ctx.downloads, Arc::clone(&ctx.store));
    let urls: Vec<&str> = jobs.iter().map(|(_, url)| url.as_str()).collect();
    let cached = status.refresh_cache_status(&urls).await;

    let bars = Arc::new(DownloadBars::new());
    if cached > 0 {
        bars.println(format!("{cached} of {} already cached", jobs.len()));
    }
    for (track_id, url) in &jobs {
        bars.add(track_id, url);
    }

    let sink = Arc::clone(&bars);
    let _subscription = ctx
        .downloads
        .subscribe(Arc::new(move |progress: &DownloadProgress| sink.update(progress)));

    let waits = jobs
        .iter()
        .map(|(track_id, url)| ctx.downloads.download_and_wait(track_id.clone(), url));

    let outcomes = tokio::select! {
        outcomes = join_all(waits) => outcomes,
        _ = tokio::signal::ctrl_c() => {
            ctx.downloads.cancel_all();
            return Err(CliError::Interrupted.into());
        }
    };

    let failed: Vec<&DownloadProgress> = outcomes
        .iter()
        .filter(|outcome| outcome.state != DownloadState::Complete)
        .collect();

    println!(
        "{} of {} downloads complete",
        outcomes.len() - failed.len(),
        outcomes.len()
    );

    if failed.is_empty() {
        return Ok(());
    }
    for outcome in &failed {
        eprintln!(
            "  {}: {}",
            outcome.url,
            outcome
                .error_message
                .as_deref()
                .unwrap_or(outcome.state.as_str())
        );
    }
    Err(CliError::Download(format!("{} of {} failed", failed.len(), outcomes.len())).into())
}
