//! Download worker pipeline.
//!
//! This module contains one fetch attempt, isolated from the queue
//! orchestration. The worker operates on value types and cloned Arc
//! dependencies, with no access to the manager's state lock.
//!
//! # Design Principles
//!
//! - Worker receives a `DownloadJob` (value type) and `WorkerDeps` (cloned Arcs)
//! - Worker reports bytes through a callback, never publishes progress itself
//! - Cancellation is handled via `tokio::select!` around the whole attempt and
//!   re-checked before every buffered chunk
//! - Persisting the payload is left to the manager

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use audiostash_core::download::{DownloadError, TrackId};
use audiostash_core::ports::{AudioFetcherPort, DownloadManagerConfig};

use crate::progress::ProgressThrottle;

/// Largest up-front buffer reservation taken from a declared content length.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Dependencies for the download worker.
#[derive(Clone)]
pub struct WorkerDeps {
    /// Source of remote bytes.
    pub fetcher: Arc<dyn AudioFetcherPort>,
    /// Timeout, throttle interval and content type fallback.
    pub config: DownloadManagerConfig,
}

/// A single attempt to be executed by the worker.
pub struct DownloadJob {
    /// Track being downloaded (for logging).
    pub track_id: TrackId,
    /// Source URL.
    pub url: String,
    /// Cancellation token for this attempt.
    pub cancel: CancellationToken,
}

/// A fully buffered, non-empty payload.
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    /// The complete body.
    pub payload: Bytes,
    /// Declared content type, or the configured fallback.
    pub content_type: String,
}

impl FetchedPayload {
    /// Payload length in bytes.
    pub fn byte_size(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// Run one fetch attempt to completion.
///
/// `on_progress(loaded, total)` is called (throttled) as bytes arrive; `total`
/// is 0 when the source declared no length.
///
/// # Cancellation
///
/// When `job.cancel` fires this returns `Err(DownloadError::Cancelled)` and
/// drops the in-flight response.
pub async fn run_job<F>(
    job: &DownloadJob,
    deps: &WorkerDeps,
    on_progress: F,
) -> Result<FetchedPayload, DownloadError>
where
    F: Fn(u64, u64) + Send + Sync,
{
    let timeout = deps.config.fetch_timeout;

    tokio::select! {
        biased;

        () = job.cancel.cancelled() => {
            Err(DownloadError::Cancelled)
        }

        result = tokio::time::timeout(timeout, fetch_payload(job, deps, &on_progress)) => {
            result.unwrap_or_else(|_| {
                tracing::debug!(target: "audiostash.download", track_id = %job.track_id, ?timeout, "Fetch attempt timed out");
                Err(DownloadError::timeout(timeout.as_secs()))
            })
        }
    }
}

async fn fetch_payload<F>(
    job: &DownloadJob,
    deps: &WorkerDeps,
    on_progress: &F,
) -> Result<FetchedPayload, DownloadError>
where
    F: Fn(u64, u64) + Send + Sync,
{
    let response = deps.fetcher.fetch(&job.url).await?;
    let total = response.content_length.unwrap_or(0);
    let content_type = response
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| deps.config.default_content_type.clone());

    let capacity = usize::try_from(total)
        .unwrap_or(MAX_PREALLOCATION)
        .min(MAX_PREALLOCATION);
    let mut buffer = BytesMut::with_capacity(capacity);
    let mut throttle = ProgressThrottle::new(deps.config.progress_interval);
    let mut body = response.body;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if job.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        buffer.extend_from_slice(&chunk);

        let loaded = buffer.len() as u64;
        if throttle.should_emit(loaded, total) {
            on_progress(loaded, total);
        }
    }

    if buffer.is_empty() {
        return Err(DownloadError::EmptyPayload);
    }

    tracing::debug!(
        target: "audiostash.download",
        track_id = %job.track_id,
        bytes = buffer.len(),
        declared = total,
        "Fetch attempt finished"
    );

    Ok(FetchedPayload {
        payload: buffer.freeze(),
        content_type,
    })
}
