//! Progress broadcast: the publish/subscribe registry behind every
//! download observer.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::download::{DownloadProgress, TrackId};

/// Observer invoked for every progress change.
pub type ProgressCallback = Arc<dyn Fn(&DownloadProgress) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: IndexMap<u64, ProgressCallback>,
    latest: IndexMap<TrackId, DownloadProgress>,
    outbox: VecDeque<DownloadProgress>,
    delivering: bool,
}

/// Explicitly owned publish/subscribe registry.
///
/// Publishing is split in two steps so owners can record a transition while
/// holding their own lock and deliver it after releasing that lock:
///
/// - [`stage`](Self::stage) records the progress as the track's latest value
///   and appends it to the outbox.
/// - [`flush`](Self::flush) delivers the outbox to every subscriber, outside
///   any lock.
///
/// Delivery order equals staging order. Only one thread delivers at a time; a
/// `flush` that finds delivery already underway (another thread, or a callback
/// publishing re-entrantly) returns immediately and the active deliverer picks
/// its events up.
#[derive(Clone, Default)]
pub struct ProgressBroadcast {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for ProgressBroadcast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("ProgressBroadcast")
            .field("subscribers", &registry.subscribers.len())
            .field("tracks", &registry.latest.len())
            .finish()
    }
}

impl ProgressBroadcast {
    /// Create an empty broadcast.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe(&self, callback: ProgressCallback) -> Subscription {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, callback);
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Stage and deliver in one step.
    pub fn publish(&self, progress: DownloadProgress) {
        self.stage(progress);
        self.flush();
    }

    /// Record `progress` as the track's latest value and queue it for delivery.
    pub fn stage(&self, progress: DownloadProgress) {
        let mut registry = self.registry.lock();
        registry
            .latest
            .insert(progress.track_id.clone(), progress.clone());
        registry.outbox.push_back(progress);
    }

    /// Deliver every staged event to the current subscribers.
    pub fn flush(&self) {
        {
            let mut registry = self.registry.lock();
            if registry.delivering || registry.outbox.is_empty() {
                return;
            }
            registry.delivering = true;
        }

        let guard = DeliveryGuard(&self.registry);
        loop {
            let mut registry = self.registry.lock();
            let Some(progress) = registry.outbox.pop_front() else {
                // Cleared under the same lock that saw the empty outbox, so a
                // concurrent `stage` either lands before this or flushes itself.
                registry.delivering = false;
                drop(registry);
                std::mem::forget(guard);
                return;
            };
            let subscribers: Vec<ProgressCallback> =
                registry.subscribers.values().cloned().collect();
            drop(registry);

            for callback in &subscribers {
                callback(&progress);
            }
        }
    }

    /// Latest progress for `track_id`, if one was ever published.
    pub fn latest(&self, track_id: &TrackId) -> Option<DownloadProgress> {
        self.registry.lock().latest.get(track_id).cloned()
    }

    /// Latest progress of every track, in first-seen order.
    pub fn all_latest(&self) -> Vec<DownloadProgress> {
        self.registry.lock().latest.values().cloned().collect()
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

/// Clears the delivering flag when a callback panics mid-delivery.
struct DeliveryGuard<'a>(&'a Mutex<Registry>);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().delivering = false;
    }
}

/// Disposer returned by [`ProgressBroadcast::subscribe`].
///
/// Dropping it unregisters the observer.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Unregister the observer now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().subscribers.shift_remove(&self.id);
        }
    }
}
