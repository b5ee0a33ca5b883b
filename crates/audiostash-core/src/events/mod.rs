//! Progress broadcast for download observers.
//!
//! # Structure
//!
//! - `broadcast` - Publish/subscribe registry of `DownloadProgress` changes
//!
//! Any number of observers (lists, menus, badges, CLI progress bars) attach
//! with a callback and see every transition of every track, in publish order.

mod broadcast;

pub use broadcast::{ProgressBroadcast, ProgressCallback, Subscription};
