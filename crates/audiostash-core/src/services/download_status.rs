//! UI-facing download status view.
//!
//! Mirrors the progress broadcast into a queryable snapshot and remembers
//! which URLs are known to be cached, so list rows and badges can render
//! without awaiting the store on every frame.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::download::{DownloadProgress, DownloadState, TrackId};
use crate::events::Subscription;
use crate::ports::{BlobStorePort, DownloadManagerPort};

#[derive(Debug, Default)]
struct StatusView {
    progress: HashMap<TrackId, DownloadProgress>,
    cached_urls: HashSet<String>,
}

impl StatusView {
    fn apply(&mut self, progress: &DownloadProgress) {
        if progress.state == DownloadState::Complete {
            self.cached_urls.insert(progress.url.clone());
        }
        self.progress
            .insert(progress.track_id.clone(), progress.clone());
    }

    /// Snapshot value for a track no delivered event has reached yet.
    fn seed(&mut self, progress: &DownloadProgress) {
        if !self.progress.contains_key(&progress.track_id) {
            self.apply(progress);
        }
    }
}

/// Live status of every download plus a cache-membership memo.
pub struct DownloadStatusStore {
    store: Arc<dyn BlobStorePort>,
    view: Arc<Mutex<StatusView>>,
    _subscription: Subscription,
}

impl std::fmt::Debug for DownloadStatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStatusStore")
            .field("view", &*self.view.lock())
            .finish_non_exhaustive()
    }
}

impl DownloadStatusStore {
    /// Attach to a manager.
    ///
    /// Subscribes first and seeds from the manager's snapshot afterwards, so
    /// a transition published in between reaches the view either way.
    pub fn new(manager: &dyn DownloadManagerPort, store: Arc<dyn BlobStorePort>) -> Self {
        let view = Arc::new(Mutex::new(StatusView::default()));

        let sink = Arc::clone(&view);
        let subscription = manager.subscribe(Arc::new(move |progress: &DownloadProgress| {
            sink.lock().apply(progress);
        }));

        let snapshot = manager.get_all_progress();
        {
            let mut view = view.lock();
            for progress in &snapshot {
                view.seed(progress);
            }
        }

        Self {
            store,
            view,
            _subscription: subscription,
        }
    }

    /// Latest progress for a track.
    pub fn progress(&self, track_id: &TrackId) -> Option<DownloadProgress> {
        self.view.lock().progress.get(track_id).cloned()
    }

    /// Current state; `idle` for tracks never seen.
    pub fn state(&self, track_id: &TrackId) -> DownloadState {
        self.view
            .lock()
            .progress
            .get(track_id)
            .map_or(DownloadState::Idle, |p| p.state)
    }

    /// Queued or downloading.
    pub fn is_downloading(&self, track_id: &TrackId) -> bool {
        self.state(track_id).is_in_progress()
    }

    /// Finished successfully in this session.
    pub fn is_downloaded(&self, track_id: &TrackId) -> bool {
        self.state(track_id) == DownloadState::Complete
    }

    /// Percent complete; 0 when unknown.
    pub fn progress_percent(&self, track_id: &TrackId) -> u8 {
        self.view
            .lock()
            .progress
            .get(track_id)
            .map_or(0, |p| p.progress_percent)
    }

    /// Memoized cache membership. Does not touch the store.
    pub fn is_cached(&self, url: &str) -> bool {
        self.view.lock().cached_urls.contains(url)
    }

    /// Ask the store whether `url` is cached and remember the answer.
    pub async fn check_cache_status(&self, url: &str) -> bool {
        let cached = self.store.has(url).await;
        let mut view = self.view.lock();
        if cached {
            view.cached_urls.insert(url.to_string());
        } else {
            view.cached_urls.remove(url);
        }
        cached
    }

    /// Bulk `check_cache_status`. Returns how many of `urls` are cached.
    pub async fn refresh_cache_status<S: AsRef<str> + Sync>(&self, urls: &[S]) -> usize {
        let mut cached = 0;
        for url in urls {
            if self.check_cache_status(url.as_ref()).await {
                cached += 1;
            }
        }
        cached
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::cache::MemoryBlobStore;
    use crate::events::{ProgressBroadcast, ProgressCallback};

    /// Manager stand-in that only relays whatever the test publishes.
    #[derive(Default)]
    struct RelayManager {
        broadcast: ProgressBroadcast,
    }

    #[async_trait]
    impl DownloadManagerPort for RelayManager {
        fn enqueue(&self, _track_id: TrackId, _url: &str) -> bool {
            false
        }
        fn cancel(&self, _track_id: &TrackId) -> bool {
            false
        }
        fn cancel_all(&self) {}
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
            self.get_progress(track_id)
                .is_some_and(|p| p.state.is_in_progress())
        }
        async fn download_and_wait(&self, track_id: TrackId, url: &str) -> DownloadProgress {
            DownloadProgress::idle(track_id, url)
        }
    }

    /// Publishes `complete(t1)` right after handing out its snapshot.
    #[derive(Default)]
    struct LateCompleteManager {
        relay: RelayManager,
    }

    #[async_trait]
    impl DownloadManagerPort for LateCompleteManager {
        fn enqueue(&self, track_id: TrackId, url: &str) -> bool {
            self.relay.enqueue(track_id, url)
        }
        fn cancel(&self, track_id: &TrackId) -> bool {
            self.relay.cancel(track_id)
        }
        fn cancel_all(&self) {}
        fn subscribe(&self, callback: ProgressCallback) -> Subscription {
            self.relay.subscribe(callback)
        }
        fn get_progress(&self, track_id: &TrackId) -> Option<DownloadProgress> {
            self.relay.get_progress(track_id)
        }
        fn get_all_progress(&self) -> Vec<DownloadProgress> {
            let snapshot = self.relay.get_all_progress();
            self.relay
                .broadcast
                .publish(DownloadProgress::complete(track("t1"), "u1", 10));
            snapshot
        }
        fn is_downloading(&self, track_id: &TrackId) -> bool {
            self.relay.is_downloading(track_id)
        }
        async fn download_and_wait(&self, track_id: TrackId, url: &str) -> DownloadProgress {
            self.relay.download_and_wait(track_id, url).await
        }
    }

    fn track(id: &str) -> TrackId {
        TrackId::new(id)
    }

    #[test]
    fn test_follows_broadcast() {
        let manager = RelayManager::default();
        let status = DownloadStatusStore::new(&manager, Arc::new(MemoryBlobStore::new()));

        assert_eq!(status.state(&track("t1")), DownloadState::Idle);

        manager
            .broadcast
            .publish(DownloadProgress::downloading(track("t1"), "u1", 5, 10));
        assert!(status.is_downloading(&track("t1")));
        assert_eq!(status.progress_percent(&track("t1")), 50);
        assert!(!status.is_cached("u1"));

        manager
            .broadcast
            .publish(DownloadProgress::complete(track("t1"), "u1", 10));
        assert!(status.is_downloaded(&track("t1")));
        assert!(!status.is_downloading(&track("t1")));
        assert!(status.is_cached("u1"));
    }

    #[test]
    fn test_seeds_existing_progress() {
        let manager = RelayManager::default();
        manager
            .broadcast
            .publish(DownloadProgress::failed(track("t1"), "u1", "HTTP 500"));

        let status = DownloadStatusStore::new(&manager, Arc::new(MemoryBlobStore::new()));
        let progress = status.progress(&track("t1")).unwrap();
        assert_eq!(progress.state, DownloadState::Error);
        assert_eq!(progress.error_message.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_transition_during_attach_is_not_lost() {
        let manager = LateCompleteManager::default();
        manager
            .relay
            .broadcast
            .publish(DownloadProgress::downloading(track("t1"), "u1", 5, 10));

        let status = DownloadStatusStore::new(&manager, Arc::new(MemoryBlobStore::new()));

        assert_eq!(
            manager.get_progress(&track("t1")).map(|p| p.state),
            Some(DownloadState::Complete)
        );
        assert_eq!(status.state(&track("t1")), DownloadState::Complete);
        assert!(status.is_cached("u1"));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let manager = RelayManager::default();
        let status = DownloadStatusStore::new(&manager, Arc::new(MemoryBlobStore::new()));
        assert_eq!(manager.broadcast.subscriber_count(), 1);
        drop(status);
        assert_eq!(manager.broadcast.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_check_cache_status_asks_store() {
        let store = Arc::new(MemoryBlobStore::new());
        store
            .put("u1", Bytes::from_static(b"abc"), "audio/mpeg")
            .await
            .unwrap();
        let manager = RelayManager::default();
        let status = DownloadStatusStore::new(&manager, store.clone());

        assert!(!status.is_cached("u1"));
        assert!(status.check_cache_status("u1").await);
        assert!(status.is_cached("u1"));

        store.remove("u1").await.unwrap();
        assert_eq!(status.refresh_cache_status(&["u1", "u2"]).await, 0);
        assert!(!status.is_cached("u1"));
    }
}
