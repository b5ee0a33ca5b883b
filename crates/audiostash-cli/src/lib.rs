//! Command-line adapter for audiostash.
//!
//! Download remote audio into the offline cache, resolve cached sources for
//! playback, and inspect or prune the cache.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used only by the binary entry point
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod utils;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{CacheCommand, Commands};
pub use error::CliError;
pub use parser::Cli;
