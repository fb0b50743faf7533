use ferry_client::ReqwestFetcher;
use ferry_core::models::{FieldValue, Record};
use ferry_core::{NullReporter, ResolverConfig, ResourceResolver, StaticDirectory};

use crate::common::{IMAGE_BODY, TestServer};

#[tokio::test]
async fn batch_over_http_fetches_each_name_once() {
    let server = TestServer::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let resolver = ResourceResolver::new(
        ReqwestFetcher::new().unwrap(),
        StaticDirectory::new(dir.path()),
        NullReporter,
        ResolverConfig::default().with_concurrency_limit(3),
    );

    let shared = server.url("/media/shared.jpg");
    let gallery = [
        server.url("/media/shared.jpg"),
        server.url("/media/g1.jpg"),
        server.url("/error/broken.jpg"),
    ]
    .join(",");
    let mut records = vec![
        Record::from_iter([("sku", "A"), ("image", shared.as_str())]),
        Record::from_iter([
            ("sku", "B"),
            ("thumbnail", shared.as_str()),
            ("additional_images", gallery.as_str()),
        ]),
    ];

    let stats = resolver.process(&mut records).await.unwrap();

    assert_eq!(server.hits(), 3);
    assert_eq!(stats.fetches, 3);
    assert_eq!(stats.failures, 1);
    assert_eq!(records[0].text("image"), Some("shared.jpg"));
    assert_eq!(records[1].text("thumbnail"), Some("shared.jpg"));
    assert_eq!(
        records[1].text("additional_images"),
        Some("shared.jpg,g1.jpg,")
    );

    let import = dir.path().join("import");
    assert_eq!(std::fs::read(import.join("shared.jpg")).unwrap(), IMAGE_BODY);
    assert!(!import.join("broken.jpg").exists());
}

#[tokio::test]
async fn failed_scalar_is_cleared() {
    let server = TestServer::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let resolver = ResourceResolver::new(
        ReqwestFetcher::new().unwrap(),
        StaticDirectory::new(dir.path()),
        NullReporter,
        ResolverConfig::default(),
    );
    let mut records = vec![Record::from_iter([(
        "image",
        server.url("/missing/gone.jpg"),
    )])];

    let stats = resolver.process(&mut records).await.unwrap();

    assert_eq!(stats.failures, 1);
    assert_eq!(records[0].get("image"), Some(&FieldValue::Null));
}
