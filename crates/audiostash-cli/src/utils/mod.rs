//! Shared helpers for command handlers.

pub mod input;
pub mod source;
