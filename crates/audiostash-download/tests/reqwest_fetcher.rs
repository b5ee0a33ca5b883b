//! `ReqwestFetcher` against a local axum server, end to end into SQLite.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::get;
use futures_util::StreamExt;

use audiostash_core::{
    AudioFetcherPort, BlobStorePort, DownloadError, DownloadManagerConfig, DownloadManagerPort,
    DownloadState, TrackId,
};
use audiostash_db::{SqliteBlobStore, setup_test_database};
use audiostash_download::{DownloadManagerDeps, ReqwestFetcher, build_download_manager};

const SONG: &[u8] = b"ID3\x04\x00fake mp3 frames";

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route(
            "/song.mp3",
            get(|| async { ([(header::CONTENT_TYPE, "audio/mpeg")], SONG) }),
        )
        .route(
            "/song.ogg",
            get(|| async { ([(header::CONTENT_TYPE, "audio/ogg; codecs=vorbis")], SONG) }),
        )
        .route("/empty.mp3", get(|| async { Vec::<u8>::new() }))
        .route("/gone.mp3", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn fetch_streams_body_and_headers() {
    let addr = serve().await;
    let fetcher = ReqwestFetcher::new().unwrap();

    let response = fetcher
        .fetch(&format!("http://{addr}/song.ogg"))
        .await
        .unwrap();
    assert_eq!(response.content_length, Some(SONG.len() as u64));
    assert_eq!(response.content_type.as_deref(), Some("audio/ogg"));

    let mut body = Vec::new();
    let mut stream = response.body;
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, SONG);
}

#[tokio::test]
async fn fetch_maps_http_errors() {
    let addr = serve().await;
    let fetcher = ReqwestFetcher::new().unwrap();

    let err = fetcher
        .fetch(&format!("http://{addr}/gone.mp3"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DownloadError::Network {
            status_code: Some(404),
            ..
        }
    ));
    assert!(err.is_retryable());

    let err = fetcher.fetch("file:///etc/passwd").await.unwrap_err();
    assert!(matches!(err, DownloadError::InvalidUrl { .. }));
}

#[tokio::test]
async fn manager_downloads_into_sqlite_cache() {
    let addr = serve().await;
    let pool = setup_test_database().await.unwrap();
    let store = Arc::new(SqliteBlobStore::new(pool));
    let manager = build_download_manager(DownloadManagerDeps {
        store: store.clone(),
        fetcher: Arc::new(ReqwestFetcher::new().unwrap()),
        config: DownloadManagerConfig::default(),
    });

    let url = format!("http://{addr}/song.mp3");
    let outcome = manager.download_and_wait(TrackId::new("song"), &url).await;

    assert_eq!(outcome.state, DownloadState::Complete);
    assert_eq!(outcome.bytes_total, SONG.len() as u64);

    let entry = store.get(&url).await.unwrap().unwrap();
    assert_eq!(&entry.payload[..], SONG);
    assert_eq!(entry.content_type, "audio/mpeg");
}

#[tokio::test]
async fn manager_rejects_empty_http_body() {
    let addr = serve().await;
    let pool = setup_test_database().await.unwrap();
    let store = Arc::new(SqliteBlobStore::new(pool));
    let manager = build_download_manager(DownloadManagerDeps {
        store: store.clone(),
        fetcher: Arc::new(ReqwestFetcher::new().unwrap()),
        config: DownloadManagerConfig::default().with_max_retries(0),
    });

    let url = format!("http://{addr}/empty.mp3");
    let outcome = manager.download_and_wait(TrackId::new("empty"), &url).await;

    assert_eq!(outcome.state, DownloadState::Error);
    assert!(!store.has(&url).await);
}
