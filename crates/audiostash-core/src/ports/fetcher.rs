//! Audio fetch port definition.
//!
//! A fetcher performs one plain HTTP-GET-like byte fetch. Retries, timeouts
//! and cancellation are applied by the caller around the returned stream.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::download::DownloadError;

/// Body of a fetch, yielded chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DownloadError>> + Send>>;

/// Response headers of interest plus the body stream.
pub struct FetchResponse {
    /// Declared total size (`content-length`), if any.
    pub content_length: Option<u64>,
    /// Declared MIME type (`content-type`), if any.
    pub content_type: Option<String>,
    /// Body chunks.
    pub body: ByteStream,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Network access for the download pipeline.
#[async_trait]
pub trait AudioFetcherPort: Send + Sync {
    /// Start fetching `url`.
    ///
    /// Returns once the response status is known. Non-success statuses map to
    /// `DownloadError::Network` carrying the status code.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, DownloadError>;
}
