//! Command-line source argument parsing.

use std::path::PathBuf;

use audiostash_core::SourceDescriptor;

/// Interpret a SOURCE argument.
///
/// `http://` and `https://` arguments are remote; anything else is a local
/// path, optionally behind a persisted handle.
pub fn parse_source(source: &str, as_handle: bool) -> SourceDescriptor {
    let lower = source.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return SourceDescriptor::remote(source.trim());
    }
    let path = PathBuf::from(source);
    if as_handle {
        SourceDescriptor::FileHandle { path }
    } else {
        SourceDescriptor::LocalFile { path }
    }
}
