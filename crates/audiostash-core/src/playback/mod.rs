//! Playback source types.
//!
//! # Structure
//!
//! - `types` - Source descriptors, playable handles, resolution outcomes
//! - `errors` - Failures the resolver propagates (storage, local file)

mod errors;
mod types;

pub use errors::PlaybackError;
pub use types::{HandleId, PlayableHandle, Playability, ResolvedSource, SourceDescriptor};
