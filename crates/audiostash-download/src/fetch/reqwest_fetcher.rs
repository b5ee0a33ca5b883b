//! `reqwest`-backed audio fetcher.
//!
//! Performs a plain GET and hands the body back as a chunk stream. Timeouts,
//! retries and cancellation are the manager's job; the client only carries a
//! connect timeout.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use audiostash_core::download::DownloadError;
use audiostash_core::ports::{AudioFetcherPort, FetchResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches audio over HTTP(S).
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with a default client.
    pub fn new() -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(concat!("audiostash/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DownloadError::other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn parse_url(url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(DownloadError::invalid_url(url)),
    }
}

fn map_reqwest_error(error: &reqwest::Error) -> DownloadError {
    match error.status() {
        Some(status) => DownloadError::network_with_status(error.to_string(), status.as_u16()),
        None => DownloadError::network(error.to_string()),
    }
}

/// Media type without parameters (`audio/mpeg; charset=x` -> `audio/mpeg`).
fn media_type(raw: &str) -> Option<String> {
    let media = raw.split(';').next().unwrap_or(raw).trim();
    (!media.is_empty()).then(|| media.to_string())
}

#[async_trait]
impl AudioFetcherPort for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        let parsed = parse_url(url)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(target: "audiostash.download", url = %url, status = %status, "Fetch rejected");
            return Err(DownloadError::network_with_status(
                status.canonical_reason().unwrap_or("Request failed"),
                status.as_u16(),
            ));
        }

        let content_length = response.content_length();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(media_type);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| map_reqwest_error(&e)));

        Ok(FetchResponse {
            content_length,
            content_type,
            body: Box::pin(body),
        })
    }
}
