//! Download error types.
//!
//! These errors are serializable and cloneable so a failure can ride inside
//! progress events and cross process boundaries without carrying foreign
//! error types like `reqwest::Error` or `sqlx::Error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for a single download attempt or its persistence.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// Network/HTTP error during the fetch.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The source answered successfully but delivered zero bytes.
    #[error("Empty result: the source returned no data")]
    EmptyPayload,

    /// The attempt did not finish within the configured fetch timeout.
    #[error("Timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// Writing the downloaded payload to the blob cache failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message.
        message: String,
    },

    /// Download was cancelled.
    #[error("Download cancelled")]
    Cancelled,

    /// URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },

    /// General/uncategorized error.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl DownloadError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub const fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether the queue should schedule another attempt.
    ///
    /// Empty payloads follow the same policy as network failures. Storage
    /// failures are never retried: re-downloading does not fix the store.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::EmptyPayload | Self::Timeout { .. }
        )
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message shown to users, copied verbatim into `DownloadProgress::error_message`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network {
                message,
                status_code: Some(code),
            } => format!("Network error (HTTP {code}): {message}"),
            Self::Network { message, .. } => format!("Network error: {message}"),
            Self::EmptyPayload => "Download returned an empty result.".to_string(),
            Self::Timeout { seconds } => format!("Download timed out after {seconds} seconds."),
            Self::Storage { message } => format!("Could not save to the offline cache: {message}"),
            Self::Cancelled => "Download was cancelled.".to_string(),
            Self::InvalidUrl { url } => format!("'{url}' is not a valid download URL."),
            Self::Other { message } => message.clone(),
        }
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = DownloadError::network_with_status("not found", 404);
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("404"));

        let parsed: DownloadError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_is_retryable() {
        assert!(DownloadError::network("reset").is_retryable());
        assert!(DownloadError::EmptyPayload.is_retryable());
        assert!(DownloadError::timeout(30).is_retryable());
        assert!(!DownloadError::storage("disk full").is_retryable());
        assert!(!DownloadError::Cancelled.is_retryable());
        assert!(!DownloadError::invalid_url("nope").is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = DownloadError::network_with_status("Not Found", 404);
        assert!(err.user_message().contains("HTTP 404"));

        let err = DownloadError::storage("quota exceeded");
        assert!(err.user_message().contains("quota exceeded"));

        assert!(DownloadError::EmptyPayload.user_message().contains("empty"));
    }
}
