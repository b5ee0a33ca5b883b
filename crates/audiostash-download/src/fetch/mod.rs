//! HTTP implementation of `AudioFetcherPort`.

mod reqwest_fetcher;

pub use reqwest_fetcher::ReqwestFetcher;
