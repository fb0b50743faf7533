use ferry_client::ReqwestFetcher;
use ferry_core::error::AppError;
use ferry_core::traits::ResourceFetcher;

use crate::common::{IMAGE_BODY, TestServer, closed_port_url};

#[tokio::test]
async fn success_streams_body_to_target() {
    let server = TestServer::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a.jpg");
    let fetcher = ReqwestFetcher::new().unwrap();

    let bytes = fetcher
        .fetch_to(&server.url("/media/a.jpg"), &target)
        .await
        .unwrap();

    assert_eq!(bytes, IMAGE_BODY.len() as u64);
    assert_eq!(std::fs::read(&target).unwrap(), IMAGE_BODY);
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn not_found_is_http_error() {
    let server = TestServer::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("missing.jpg");
    let fetcher = ReqwestFetcher::new().unwrap();

    let err = fetcher
        .fetch_to(&server.url("/missing.jpg"), &target)
        .await
        .unwrap_err();

    match err {
        AppError::HttpError(msg) => assert!(msg.starts_with("HTTP 404")),
        other => panic!("expected HttpError, got {other:?}"),
    }
    assert!(!target.exists());
}

#[tokio::test]
async fn server_error_is_http_error() {
    let server = TestServer::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ReqwestFetcher::new().unwrap();

    let err = fetcher
        .fetch_to(&server.url("/error/a.jpg"), &dir.path().join("a.jpg"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let url = closed_port_url().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ReqwestFetcher::new().unwrap();

    let err = fetcher
        .fetch_to(&url, &dir.path().join("a.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NetworkError(_)));
}

#[tokio::test]
async fn unwritable_target_is_filesystem_error() {
    let server = TestServer::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("no-such-dir").join("a.jpg");
    let fetcher = ReqwestFetcher::new().unwrap();

    let err = fetcher
        .fetch_to(&server.url("/media/a.jpg"), &target)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::FilesystemError(_)));
}
