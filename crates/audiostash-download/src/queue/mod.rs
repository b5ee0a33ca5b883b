//! Download queue management.
//!
//! Pure state machine for tasks that are not currently downloading. No I/O is
//! performed here; the `DownloadManagerImpl` owns the lock and does the I/O.
//!
//! # Design
//!
//! - Pure synchronous state machine (no async, no IO, no tracing)
//! - `pending` is strict FIFO; retried tasks rejoin at the tail
//! - `waiting` holds tasks sitting out their retry delay; they count as
//!   queued for duplicate detection but are never dequeued

mod types;

use std::collections::VecDeque;

use indexmap::IndexMap;

use audiostash_core::download::TrackId;

pub use types::QueuedTask;

/// Pending and retry-waiting tasks.
///
/// This is a sync type with no internal locking. The caller is responsible
/// for synchronization.
#[derive(Debug, Default)]
pub struct DownloadQueue {
    pending: VecDeque<QueuedTask>,
    waiting: IndexMap<TrackId, QueuedTask>,
}

impl DownloadQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks ready to start.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of tasks waiting out a retry delay.
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Pending plus waiting.
    pub fn len(&self) -> usize {
        self.pending.len() + self.waiting.len()
    }

    /// Whether the track is pending or waiting for a retry.
    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.waiting.contains_key(track_id) || self.is_pending(track_id)
    }

    /// Whether the track is in the pending FIFO.
    pub fn is_pending(&self, track_id: &TrackId) -> bool {
        self.pending.iter().any(|task| &task.track_id == track_id)
    }

    /// Append a task to the tail. The caller checks `contains` first.
    pub fn push(&mut self, task: QueuedTask) {
        self.pending.push_back(task);
    }

    /// Pop the oldest pending task.
    pub fn dequeue(&mut self) -> Option<QueuedTask> {
        self.pending.pop_front()
    }

    /// Park a task until its retry delay elapses.
    pub fn defer(&mut self, task: QueuedTask) {
        self.waiting.insert(task.track_id.clone(), task);
    }

    /// Move a parked task to the pending tail. Returns false if it is gone.
    pub fn resume(&mut self, track_id: &TrackId) -> bool {
        match self.waiting.shift_remove(track_id) {
            Some(task) => {
                self.pending.push_back(task);
                true
            }
            None => false,
        }
    }

    /// Remove a task from either side.
    pub fn remove(&mut self, track_id: &TrackId) -> Option<QueuedTask> {
        if let Some(task) = self.waiting.shift_remove(track_id) {
            return Some(task);
        }
        let index = self
            .pending
            .iter()
            .position(|task| &task.track_id == track_id)?;
        self.pending.remove(index)
    }

    /// Remove and return everything, pending first (in order), then waiting.
    pub fn drain(&mut self) -> Vec<QueuedTask> {
        let mut tasks: Vec<_> = self.pending.drain(..).collect();
        tasks.extend(self.waiting.drain(..).map(|(_, task)| task));
        tasks
    }
}
