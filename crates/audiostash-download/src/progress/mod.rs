//! Progress throttling.
//!
//! Byte-level `downloading` events are rate-limited; state transitions are
//! published by the manager directly and never pass through here.

mod throttle;

pub use throttle::ProgressThrottle;
