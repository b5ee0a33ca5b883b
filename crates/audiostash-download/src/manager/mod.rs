//! Download manager orchestration.
//!
//! `DownloadManagerImpl` owns the queue, the set of in-flight tasks, and the
//! progress broadcast. A long-lived runner task starts queued work whenever a
//! slot frees up; every fetch attempt runs on its own task.
//!
//! # Locking
//!
//! All queue and active-set mutation happens under one `parking_lot` mutex.
//! Progress events are staged under that same lock and delivered after it is
//! released, so observers see transitions in the order they were decided and
//! may call back into the manager from their callbacks.

mod worker;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use audiostash_core::download::{DownloadError, DownloadProgress, DownloadState, TrackId};
use audiostash_core::events::{ProgressBroadcast, ProgressCallback, Subscription};
use audiostash_core::ports::{
    AudioFetcherPort, BlobStorePort, DownloadManagerConfig, DownloadManagerPort,
};

use crate::queue::{DownloadQueue, QueuedTask};

use self::worker::{DownloadJob, FetchedPayload, WorkerDeps};

/// Unique identifier for one attempt (or one retry wait) of a track.
///
/// A finishing task only commits its outcome if the lease it was started
/// with is still the one registered for its track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LeaseId(u64);

/// An attempt currently holding a download slot.
struct ActiveJob {
    lease: LeaseId,
    cancel: CancellationToken,
    url: String,
}

/// A pending retry timer for a deferred task.
struct RetryTimer {
    lease: LeaseId,
    cancel: CancellationToken,
}

#[derive(Default)]
struct ManagerState {
    queue: DownloadQueue,
    active: HashMap<TrackId, ActiveJob>,
    retry_timers: HashMap<TrackId, RetryTimer>,
}

impl ManagerState {
    fn is_tracked(&self, track_id: &TrackId) -> bool {
        self.active.contains_key(track_id) || self.queue.contains(track_id)
    }

    /// Remove the active entry if `lease` still owns it.
    fn verify_and_remove_lease(&mut self, track_id: &TrackId, lease: LeaseId) -> bool {
        self.active
            .get(track_id)
            .is_some_and(|job| job.lease == lease)
            .then(|| self.active.remove(track_id))
            .is_some()
    }

    fn holds_lease(&self, track_id: &TrackId, lease: LeaseId) -> bool {
        self.active
            .get(track_id)
            .is_some_and(|job| job.lease == lease)
    }

    /// Take a track out of every collection. Returns its URL if it was present.
    fn withdraw(&mut self, track_id: &TrackId) -> Option<String> {
        let mut url = None;
        if let Some(job) = self.active.remove(track_id) {
            job.cancel.cancel();
            url = Some(job.url);
        }
        if let Some(timer) = self.retry_timers.remove(track_id) {
            timer.cancel.cancel();
        }
        if let Some(task) = self.queue.remove(track_id) {
            url.get_or_insert(task.url);
        }
        url
    }
}

/// Dependencies for creating a download manager.
pub struct DownloadManagerDeps {
    /// Where completed payloads are written.
    pub store: Arc<dyn BlobStorePort>,
    /// Source of remote bytes.
    pub fetcher: Arc<dyn AudioFetcherPort>,
    /// Configuration for the download manager.
    pub config: DownloadManagerConfig,
}

/// Build a download manager from its dependencies.
///
/// The returned `Arc` can be stored as `Arc<dyn DownloadManagerPort>` in
/// adapters. Enqueueing requires a running Tokio runtime.
pub fn build_download_manager(deps: DownloadManagerDeps) -> Arc<DownloadManagerImpl> {
    DownloadManagerImpl::new(deps.store, deps.fetcher, deps.config)
}

/// Concrete implementation of the download manager.
///
/// This struct is public but adapters should typically use
/// `Arc<dyn DownloadManagerPort>` instead of depending on this type directly.
pub struct DownloadManagerImpl {
    store: Arc<dyn BlobStorePort>,
    fetcher: Arc<dyn AudioFetcherPort>,
    config: DownloadManagerConfig,
    broadcast: ProgressBroadcast,
    state: Mutex<ManagerState>,
    /// Counter for generating lease IDs.
    lease_counter: AtomicU64,
    /// Wakes the runner when work or a free slot may be available.
    queue_notify: Arc<Notify>,
    /// Whether the runner has been started (never reset).
    runner_started: AtomicBool,
    self_ref: Weak<Self>,
}

impl std::fmt::Debug for DownloadManagerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DownloadManagerImpl")
            .field("config", &self.config)
            .field("active", &state.active.len())
            .field("pending", &state.queue.pending_len())
            .field("retry_waiting", &state.queue.waiting_len())
            .finish_non_exhaustive()
    }
}

impl DownloadManagerImpl {
    fn new(
        store: Arc<dyn BlobStorePort>,
        fetcher: Arc<dyn AudioFetcherPort>,
        config: DownloadManagerConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            store,
            fetcher,
            config,
            broadcast: ProgressBroadcast::new(),
            state: Mutex::new(ManagerState::default()),
            lease_counter: AtomicU64::new(0),
            queue_notify: Arc::new(Notify::new()),
            runner_started: AtomicBool::new(false),
            self_ref: self_ref.clone(),
        })
    }

    /// Active configuration.
    pub const fn config(&self) -> &DownloadManagerConfig {
        &self.config
    }

    /// Tasks pending or waiting for a retry.
    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Tasks currently holding a download slot.
    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    fn next_lease(&self) -> LeaseId {
        LeaseId(self.lease_counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Ensure the runner is started.
    ///
    /// Idempotent. The runner holds only a weak reference and exits once the
    /// manager is dropped.
    fn ensure_runner(&self) {
        if self
            .runner_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let weak = self.self_ref.clone();
            let notify = Arc::clone(&self.queue_notify);
            tokio::spawn(async move {
                loop {
                    let Some(manager) = weak.upgrade() else {
                        break;
                    };
                    manager.start_ready_jobs();
                    drop(manager);
                    notify.notified().await;
                }
                debug!(target: "audiostash.download", "Download runner stopped");
            });
        }
    }

    /// Move pending tasks into free slots and spawn their attempts.
    fn start_ready_jobs(self: &Arc<Self>) {
        let mut started = Vec::new();
        {
            let mut state = self.state.lock();
            while state.active.len() < self.config.max_concurrent {
                let Some(task) = state.queue.dequeue() else {
                    break;
                };
                let lease = self.next_lease();
                let cancel = CancellationToken::new();
                state.active.insert(
                    task.track_id.clone(),
                    ActiveJob {
                        lease,
                        cancel: cancel.clone(),
                        url: task.url.clone(),
                    },
                );
                started.push((task, lease, cancel));
            }
        }

        for (task, lease, cancel) in started {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                manager.run_task(task, lease, cancel).await;
                manager.queue_notify.notify_one();
            });
        }
    }

    /// One attempt: cache re-check, fetch, persist, then commit the outcome.
    async fn run_task(&self, task: QueuedTask, lease: LeaseId, cancel: CancellationToken) {
        if self.store.has(&task.url).await {
            debug!(
                target: "audiostash.download",
                track_id = %task.track_id,
                url = %task.url,
                "Already cached, skipping fetch"
            );
            self.finish(
                &task,
                lease,
                DownloadProgress::complete(task.track_id.clone(), &task.url, 0),
            );
            return;
        }

        if !self.publish_if_current(
            &task.track_id,
            lease,
            DownloadProgress::downloading(task.track_id.clone(), &task.url, 0, 0),
        ) {
            return;
        }

        debug!(
            target: "audiostash.download",
            track_id = %task.track_id,
            attempt = task.retry_count + 1,
            waited_ms = u64::try_from(task.queued_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Starting download attempt"
        );

        let job = DownloadJob {
            track_id: task.track_id.clone(),
            url: task.url.clone(),
            cancel: cancel.clone(),
        };
        let deps = WorkerDeps {
            fetcher: Arc::clone(&self.fetcher),
            config: self.config.clone(),
        };
        let result = worker::run_job(&job, &deps, |loaded, total| {
            self.publish_if_current(
                &task.track_id,
                lease,
                DownloadProgress::downloading(task.track_id.clone(), &task.url, loaded, total),
            );
        })
        .await;

        match result {
            Ok(fetched) => self.persist(&task, lease, &cancel, fetched).await,
            Err(DownloadError::Cancelled) => {
                debug!(target: "audiostash.download", track_id = %task.track_id, "Attempt cancelled");
            }
            Err(e) => self.handle_failure(task, lease, &e),
        }
    }

    /// Write the payload, then report `complete`. Nothing is written once the
    /// attempt has been cancelled.
    async fn persist(
        &self,
        task: &QueuedTask,
        lease: LeaseId,
        cancel: &CancellationToken,
        fetched: FetchedPayload,
    ) {
        if cancel.is_cancelled() {
            debug!(target: "audiostash.download", track_id = %task.track_id, "Cancelled before persist");
            return;
        }

        let byte_size = fetched.byte_size();
        // A cancel landing while `put` runs still leaves the entry written;
        // the lease check in `finish` drops the `complete` event.
        match self
            .store
            .put(&task.url, fetched.payload, &fetched.content_type)
            .await
        {
            Ok(()) => {
                info!(
                    target: "audiostash.download",
                    track_id = %task.track_id,
                    bytes = byte_size,
                    "Download complete"
                );
                self.finish(
                    task,
                    lease,
                    DownloadProgress::complete(task.track_id.clone(), &task.url, byte_size),
                );
            }
            Err(e) => {
                let err = DownloadError::storage(e.to_string());
                warn!(
                    target: "audiostash.download",
                    track_id = %task.track_id,
                    error = %e,
                    "Failed to persist download"
                );
                self.finish(
                    task,
                    lease,
                    DownloadProgress::failed(task.track_id.clone(), &task.url, err.user_message()),
                );
            }
        }
    }

    fn handle_failure(&self, task: QueuedTask, lease: LeaseId, error: &DownloadError) {
        if error.is_retryable() && task.retry_count < self.config.max_retries {
            self.schedule_retry(task, lease, error);
            return;
        }

        warn!(
            target: "audiostash.download",
            track_id = %task.track_id,
            attempts = task.retry_count + 1,
            error = %error,
            "Download failed"
        );
        let progress =
            DownloadProgress::failed(task.track_id.clone(), &task.url, error.user_message());
        self.finish(&task, lease, progress);
    }

    /// Park the task for `retry_delay`, reporting it as queued meanwhile.
    fn schedule_retry(&self, task: QueuedTask, lease: LeaseId, error: &DownloadError) {
        let track_id = task.track_id.clone();
        let timer_lease = self.next_lease();
        let timer_cancel = CancellationToken::new();
        {
            let mut state = self.state.lock();
            if !state.verify_and_remove_lease(&track_id, lease) {
                debug!(target: "audiostash.download", track_id = %track_id, "Ignoring stale retry (lease mismatch)");
                return;
            }
            let next = task.next_attempt();
            info!(
                target: "audiostash.download",
                track_id = %track_id,
                retry = next.retry_count,
                max_retries = self.config.max_retries,
                error = %error,
                "Download attempt failed, will retry"
            );
            self.broadcast
                .stage(DownloadProgress::queued(track_id.clone(), &next.url));
            state.queue.defer(next);
            state.retry_timers.insert(
                track_id.clone(),
                RetryTimer {
                    lease: timer_lease,
                    cancel: timer_cancel.clone(),
                },
            );
        }
        self.broadcast.flush();

        let manager = self.self_ref.clone();
        let delay = self.config.retry_delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = timer_cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
            if let Some(manager) = manager.upgrade() {
                manager.resume_retry(&track_id, timer_lease);
            }
        });
    }

    fn resume_retry(&self, track_id: &TrackId, timer_lease: LeaseId) {
        let resumed = {
            let mut state = self.state.lock();
            let current = state
                .retry_timers
                .get(track_id)
                .is_some_and(|timer| timer.lease == timer_lease);
            if current {
                state.retry_timers.remove(track_id);
            }
            current && state.queue.resume(track_id)
        };
        if resumed {
            self.queue_notify.notify_one();
        }
    }

    /// Commit a terminal outcome if `lease` still owns the track.
    fn finish(&self, task: &QueuedTask, lease: LeaseId, progress: DownloadProgress) {
        let committed = {
            let mut state = self.state.lock();
            let committed = state.verify_and_remove_lease(&task.track_id, lease);
            if committed {
                self.broadcast.stage(progress);
            }
            committed
        };
        if committed {
            self.broadcast.flush();
        } else {
            debug!(target: "audiostash.download", track_id = %task.track_id, "Ignoring stale finalize (lease mismatch)");
        }
    }

    /// Publish a non-terminal update if `lease` still owns the track.
    fn publish_if_current(
        &self,
        track_id: &TrackId,
        lease: LeaseId,
        progress: DownloadProgress,
    ) -> bool {
        let current = {
            let state = self.state.lock();
            let current = state.holds_lease(track_id, lease);
            if current {
                self.broadcast.stage(progress);
            }
            current
        };
        if current {
            self.broadcast.flush();
        }
        current
    }
}

impl Drop for DownloadManagerImpl {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for job in state.active.values() {
            job.cancel.cancel();
        }
        for timer in state.retry_timers.values() {
            timer.cancel.cancel();
        }
        // Lets the runner observe the dropped manager and exit.
        self.queue_notify.notify_one();
    }
}

#[async_trait]
impl DownloadManagerPort for DownloadManagerImpl {
    fn enqueue(&self, track_id: TrackId, url: &str) -> bool {
        {
            let mut state = self.state.lock();
            if state.is_tracked(&track_id) {
                debug!(target: "audiostash.download", track_id = %track_id, "Already queued or downloading");
                return false;
            }
            self.broadcast
                .stage(DownloadProgress::queued(track_id.clone(), url));
            state.queue.push(QueuedTask::new(track_id.clone(), url));
        }
        self.broadcast.flush();

        info!(target: "audiostash.download", track_id = %track_id, url = %url, "Queued download");
        self.ensure_runner();
        self.queue_notify.notify_one();
        true
    }

    fn cancel(&self, track_id: &TrackId) -> bool {
        let cancelled = {
            let mut state = self.state.lock();
            let url = state.withdraw(track_id);
            if let Some(url) = &url {
                self.broadcast
                    .stage(DownloadProgress::idle(track_id.clone(), url));
            }
            url.is_some()
        };
        if cancelled {
            self.broadcast.flush();
            info!(target: "audiostash.download", track_id = %track_id, "Cancelled download");
            self.queue_notify.notify_one();
        }
        cancelled
    }

    fn cancel_all(&self) {
        let count = {
            let mut state = self.state.lock();
            for (_, timer) in state.retry_timers.drain() {
                timer.cancel.cancel();
            }
            let active: Vec<(TrackId, ActiveJob)> = state.active.drain().collect();
            let queued = state.queue.drain();
            let count = active.len() + queued.len();

            for (track_id, job) in active {
                job.cancel.cancel();
                self.broadcast.stage(DownloadProgress::idle(track_id, job.url));
            }
            for task in queued {
                self.broadcast
                    .stage(DownloadProgress::idle(task.track_id, task.url));
            }
            count
        };
        self.broadcast.flush();
        if count > 0 {
            info!(target: "audiostash.download", count, "Cancelled all downloads");
        }
    }

    fn subscribe(&self, callback: ProgressCallback) -> Subscription {
        self.broadcast.subscribe(callback)
    }

    fn get_progress(&self, track_id: &TrackId) -> Option<DownloadProgress> {
        self.broadcast.latest(track_id)
    }

    fn get_all_progress(&self) -> Vec<DownloadProgress> {
        self.broadcast.all_latest()
    }

    fn is_downloading(&self, track_id: &TrackId) -> bool {
        self.state.lock().is_tracked(track_id)
    }

    async fn download_and_wait(&self, track_id: TrackId, url: &str) -> DownloadProgress {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watched = track_id.clone();
        let subscription = self.subscribe(Arc::new(move |progress: &DownloadProgress| {
            let settled = progress.is_terminal() || progress.state == DownloadState::Idle;
            if settled && progress.track_id == watched {
                let _ = tx.send(progress.clone());
            }
        }));

        self.enqueue(track_id.clone(), url);
        let outcome = rx.recv().await;
        drop(subscription);

        outcome.unwrap_or_else(|| DownloadProgress::idle(track_id, url))
    }
}
