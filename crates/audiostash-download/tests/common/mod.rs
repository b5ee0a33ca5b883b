//! Shared fixtures for download manager integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use audiostash_core::{
    AudioFetcherPort, BlobStorePort, CacheEntry, CacheStats, DownloadError, DownloadManagerConfig,
    DownloadManagerPort, DownloadProgress, DownloadState, FetchResponse, MemoryBlobStore,
    StorageError, Subscription, TrackId,
};
use audiostash_download::{DownloadManagerDeps, DownloadManagerImpl, build_download_manager};

/// What one fetch call does.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Serve these bytes in `chunk`-sized pieces with a matching content length.
    Body(&'static [u8]),
    /// Fail before any body is produced.
    Fail(DownloadError),
    /// Succeed with a zero-length body.
    Empty,
}

/// Fetcher driven by per-URL scripts.
///
/// Each URL pops replies from its script; once the script runs dry the
/// fallback reply is used. Bodies wait for `delay`, then for a gate permit if
/// a gate is installed, before yielding any bytes.
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Reply,
    chunk: usize,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<String>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn new(fallback: Reply) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            chunk: 4,
            delay: Duration::ZERO,
            gate: None,
            calls: Mutex::new(Vec::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn serving(body: &'static [u8]) -> Self {
        Self::new(Reply::Body(body))
    }

    pub fn with_script(self, url: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.scripts
            .lock()
            .insert(url.to_string(), replies.into_iter().collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Hold every body until permits are added to the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|u| *u == url).count()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Reply {
        self.scripts
            .lock()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Decrements the in-flight counter when the body is finished or dropped.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct BodyState {
    chunks: VecDeque<Bytes>,
    started: bool,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    _in_flight: InFlight,
}

#[async_trait]
impl AudioFetcherPort for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        self.calls.lock().push(url.to_string());

        let body: &'static [u8] = match self.next_reply(url) {
            Reply::Fail(e) => return Err(e),
            Reply::Empty => &[],
            Reply::Body(bytes) => bytes,
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let state = BodyState {
            chunks: body.chunks(self.chunk).map(Bytes::from_static).collect(),
            started: false,
            delay: self.delay,
            gate: self.gate.clone(),
            _in_flight: InFlight(Arc::clone(&self.in_flight)),
        };

        let stream = futures_util::stream::unfold(state, |mut state| async move {
            if !state.started {
                state.started = true;
                if !state.delay.is_zero() {
                    tokio::time::sleep(state.delay).await;
                }
                if let Some(gate) = &state.gate {
                    gate.acquire().await.ok()?.forget();
                }
            }
            let chunk = state.chunks.pop_front()?;
            Some((Ok::<Bytes, DownloadError>(chunk), state))
        });

        Ok(FetchResponse {
            content_length: Some(body.len() as u64),
            content_type: Some("audio/mpeg".to_string()),
            body: Box::pin(stream),
        })
    }
}

/// Store whose writes always fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryBlobStore,
}

#[async_trait]
impl BlobStorePort for FailingStore {
    async fn has(&self, url: &str) -> bool {
        self.inner.has(url).await
    }

    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, StorageError> {
        self.inner.get(url).await
    }

    async fn put(&self, _url: &str, _payload: Bytes, _content_type: &str) -> Result<(), StorageError> {
        Err(StorageError::Database("quota exceeded".to_string()))
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        self.inner.remove(url).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear().await
    }

    async fn stats(&self) -> Result<CacheStats, StorageError> {
        self.inner.stats().await
    }

    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.list_keys().await
    }
}

/// Config with test-friendly timings.
pub fn fast_config() -> DownloadManagerConfig {
    DownloadManagerConfig::default()
        .with_retry_delay(Duration::from_millis(10))
        .with_progress_interval(Duration::ZERO)
}

pub fn manager(
    store: Arc<dyn BlobStorePort>,
    fetcher: Arc<dyn AudioFetcherPort>,
    config: DownloadManagerConfig,
) -> Arc<DownloadManagerImpl> {
    build_download_manager(DownloadManagerDeps {
        store,
        fetcher,
        config,
    })
}

/// Records every event and the peak number of tracks seen downloading at once.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<DownloadProgress>>,
    downloading: Mutex<std::collections::HashSet<TrackId>>,
    peak_downloading: AtomicUsize,
}

impl Recorder {
    pub fn attach(manager: &dyn DownloadManagerPort) -> (Arc<Self>, Subscription) {
        let recorder = Arc::new(Self::default());
        let sink = Arc::clone(&recorder);
        let subscription = manager.subscribe(Arc::new(move |p: &DownloadProgress| sink.record(p)));
        (recorder, subscription)
    }

    fn record(&self, progress: &DownloadProgress) {
        self.events.lock().push(progress.clone());
        let mut downloading = self.downloading.lock();
        if progress.state == DownloadState::Downloading {
            downloading.insert(progress.track_id.clone());
        } else {
            downloading.remove(&progress.track_id);
        }
        self.peak_downloading
            .fetch_max(downloading.len(), Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<DownloadProgress> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, track: &str) -> Vec<DownloadProgress> {
        self.events
            .lock()
            .iter()
            .filter(|p| p.track_id.as_str() == track)
            .cloned()
            .collect()
    }

    pub fn states_for(&self, track: &str) -> Vec<DownloadState> {
        self.events_for(track).iter().map(|p| p.state).collect()
    }

    pub fn last_for(&self, track: &str) -> Option<DownloadProgress> {
        self.events_for(track).pop()
    }

    pub fn peak_downloading(&self) -> usize {
        self.peak_downloading.load(Ordering::SeqCst)
    }
}

/// Poll `condition` until it holds, panicking after five seconds.
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until the recorder's latest event for `track` is in `state`.
pub async fn wait_for_state(recorder: &Recorder, track: &str, state: DownloadState) {
    wait_until(&format!("{track} to reach {}", state.as_str()), || {
        recorder.last_for(track).is_some_and(|p| p.state == state)
    })
    .await;
}

pub fn url(track: &str) -> String {
    format!("https://cdn.test/{track}.mp3")
}
