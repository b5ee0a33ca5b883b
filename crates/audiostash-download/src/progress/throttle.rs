//! Rate-limits byte progress so fast connections don't flood observers.

use std::time::{Duration, Instant};

/// Rate-limiter for byte progress updates.
///
/// The first update of an attempt and the update that reaches the declared
/// total always pass; everything in between is spaced by `min_interval`.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a new throttle with the specified minimum interval.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// Whether an update for `loaded` of `total` bytes should be published.
    ///
    /// `total` is 0 when the source declared no size.
    pub fn should_emit(&mut self, loaded: u64, total: u64) -> bool {
        let now = Instant::now();
        let reached_total = total > 0 && loaded >= total;
        match self.last_emit {
            Some(last) if !reached_total && now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }

}
