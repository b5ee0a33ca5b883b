//! Pipeline settings and validation.
//!
//! These are pure domain types with no infrastructure dependencies. Every
//! field is optional so partial configuration (flags, env, files) layers
//! cleanly over the defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CONTENT_TYPE;
use crate::ports::download_manager::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_RETRIES, DEFAULT_PROGRESS_INTERVAL,
    DEFAULT_RETRY_DELAY,
};

/// Upper bound for `max_concurrent`.
pub const MAX_CONCURRENT_LIMIT: usize = 16;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Download pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Downloads allowed in flight at once (1-16).
    pub max_concurrent: Option<usize>,

    /// Retries after the first failed attempt (0-10).
    pub max_retries: Option<u32>,

    /// Pause before a failed download is re-queued, in milliseconds.
    pub retry_delay_ms: Option<u64>,

    /// Bound on a single fetch attempt, in seconds.
    pub fetch_timeout_secs: Option<u64>,

    /// Minimum spacing of byte-level progress events, in milliseconds.
    pub progress_interval_ms: Option<u64>,

    /// Content type stored when the source declares none.
    pub default_content_type: Option<String>,
}

impl PipelineSettings {
    /// Create settings with every default filled in.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            max_concurrent: Some(DEFAULT_MAX_CONCURRENT),
            max_retries: Some(DEFAULT_MAX_RETRIES),
            retry_delay_ms: Some(duration_millis(DEFAULT_RETRY_DELAY)),
            fetch_timeout_secs: Some(DEFAULT_FETCH_TIMEOUT.as_secs()),
            progress_interval_ms: Some(duration_millis(DEFAULT_PROGRESS_INTERVAL)),
            default_content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
        }
    }

    /// Get the effective concurrency cap (with default fallback).
    #[must_use]
    pub fn effective_max_concurrent(&self) -> usize {
        self.max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT)
    }

    /// Get the effective retry budget (with default fallback).
    #[must_use]
    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    /// Get the effective retry delay (with default fallback).
    #[must_use]
    pub fn effective_retry_delay(&self) -> Duration {
        self.retry_delay_ms
            .map_or(DEFAULT_RETRY_DELAY, Duration::from_millis)
    }

    /// Get the effective per-attempt timeout (with default fallback).
    #[must_use]
    pub fn effective_fetch_timeout(&self) -> Duration {
        self.fetch_timeout_secs
            .map_or(DEFAULT_FETCH_TIMEOUT, Duration::from_secs)
    }

    /// Get the effective progress event spacing (with default fallback).
    #[must_use]
    pub fn effective_progress_interval(&self) -> Duration {
        self.progress_interval_ms
            .map_or(DEFAULT_PROGRESS_INTERVAL, Duration::from_millis)
    }

    /// Get the effective fallback content type.
    #[must_use]
    pub fn effective_default_content_type(&self) -> &str {
        self.default_content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Overlay `other` onto this one, only updating fields that are `Some`.
    pub fn merge(&mut self, other: &Self) {
        if other.max_concurrent.is_some() {
            self.max_concurrent = other.max_concurrent;
        }
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if other.retry_delay_ms.is_some() {
            self.retry_delay_ms = other.retry_delay_ms;
        }
        if other.fetch_timeout_secs.is_some() {
            self.fetch_timeout_secs = other.fetch_timeout_secs;
        }
        if other.progress_interval_ms.is_some() {
            self.progress_interval_ms = other.progress_interval_ms;
        }
        if let Some(ref content_type) = other.default_content_type {
            self.default_content_type = Some(content_type.clone());
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Max concurrent downloads must be between 1 and {MAX_CONCURRENT_LIMIT}, got {0}")]
    InvalidConcurrency(usize),

    #[error("Max retries must be between 0 and {MAX_RETRIES_LIMIT}, got {0}")]
    InvalidRetries(u32),

    #[error("Fetch timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Default content type cannot be empty")]
    EmptyContentType,
}

/// Validate settings values.
pub fn validate_settings(settings: &PipelineSettings) -> Result<(), SettingsError> {
    if let Some(max) = settings.max_concurrent {
        if !(1..=MAX_CONCURRENT_LIMIT).contains(&max) {
            return Err(SettingsError::InvalidConcurrency(max));
        }
    }

    if let Some(retries) = settings.max_retries {
        if retries > MAX_RETRIES_LIMIT {
            return Err(SettingsError::InvalidRetries(retries));
        }
    }

    if settings.fetch_timeout_secs == Some(0) {
        return Err(SettingsError::ZeroTimeout);
    }

    if settings
        .default_content_type
        .as_ref()
        .is_some_and(|ct| ct.trim().is_empty())
    {
        return Err(SettingsError::EmptyContentType);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PipelineSettings::with_defaults();
        assert_eq!(settings.max_concurrent, Some(2));
        assert_eq!(settings.max_retries, Some(2));
        assert_eq!(settings.retry_delay_ms, Some(1000));
        assert_eq!(settings.fetch_timeout_secs, Some(300));
        assert_eq!(settings.progress_interval_ms, Some(100));
        assert_eq!(settings.default_content_type.as_deref(), Some("audio/mpeg"));
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_effective_values_fall_back() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.effective_max_concurrent(), 2);
        assert_eq!(settings.effective_retry_delay(), Duration::from_secs(1));
        assert_eq!(settings.effective_default_content_type(), "audio/mpeg");
    }

    #[test]
    fn test_validate_concurrency() {
        for bad in [0, 17] {
            let settings = PipelineSettings {
                max_concurrent: Some(bad),
                ..Default::default()
            };
            assert_eq!(
                validate_settings(&settings),
                Err(SettingsError::InvalidConcurrency(bad))
            );
        }
    }

    #[test]
    fn test_validate_retries_and_timeout() {
        let settings = PipelineSettings {
            max_retries: Some(11),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidRetries(11))
        );

        let settings = PipelineSettings {
            fetch_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(validate_settings(&settings), Err(SettingsError::ZeroTimeout));
    }

    #[test]
    fn test_validate_empty_content_type() {
        let settings = PipelineSettings {
            default_content_type: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::EmptyContentType)
        );
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = PipelineSettings::with_defaults();
        let overrides = PipelineSettings {
            max_retries: Some(0),
            ..Default::default()
        };
        settings.merge(&overrides);

        assert_eq!(settings.max_retries, Some(0));
        assert_eq!(settings.max_concurrent, Some(2));
    }
}
