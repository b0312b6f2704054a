//! Integration tests for the HTTP fetcher and search source
//!
//! These tests use wiremock to serve images, garbage, slow and failing
//! responses, and run a full search session against it.

use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use image_pager::config::{parse_config, Config};
use image_pager::engine::{BatchOrchestrator, ConnectionBudget, PendingQueue, RetryPolicy};
use image_pager::fetcher::build_http_client;
use image_pager::{
    FetchOutcome, FetchedImage, Fetcher, HttpFetcher, HttpListSource, ImageBounds, ImageId,
    RenderSink, SearchError, SearchSession, UrlSource,
};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}

fn create_fetcher(thumbnail: ImageBounds) -> HttpFetcher {
    let client = build_http_client(&BTreeMap::new()).expect("Failed to build client");
    HttpFetcher::new(client, thumbnail)
}

async fn mount_png(server: &MockServer, route: &str, width: u32, height: u32) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(width, height))
                .insert_header("content-type", "image/png"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_decodes_image_and_thumbnail() {
    let mock_server = MockServer::start().await;
    mount_png(&mock_server, "/cat.png", 400, 200).await;

    let fetcher = create_fetcher(ImageBounds::new(Some(100), Some(100)));
    let url = format!("{}/cat.png", mock_server.uri());
    let outcome = fetcher.fetch(&url, Duration::from_secs(5)).await;

    match outcome {
        FetchOutcome::Success(image) => {
            assert_eq!(image.id, ImageId::from_url(&url));
            assert_eq!(image.url, url);
            assert_eq!(image.full_image.dimensions(), (400, 200));
            assert_eq!(image.thumbnail.dimensions(), (100, 50));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_non_image_is_permanent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(ImageBounds::UNBOUNDED);
    let outcome = fetcher
        .fetch(&format!("{}/page.html", mock_server.uri()), Duration::from_secs(5))
        .await;

    assert!(matches!(outcome, FetchOutcome::PermanentFailure { .. }));
}

#[tokio::test]
async fn test_fetch_timeout_is_retryable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(4, 4))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(ImageBounds::UNBOUNDED);
    let url = format!("{}/slow.png", mock_server.uri());
    let outcome = fetcher.fetch(&url, Duration::from_millis(50)).await;

    match outcome {
        FetchOutcome::RetryableFailure { url: failed, .. } => assert_eq!(failed, url),
        other => panic!("expected retryable failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_ignores_status_and_decodes_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy.png"))
        .respond_with(
            ResponseTemplate::new(503).set_body_string("<html>Service Unavailable</html>"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited.png"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404).set_body_bytes(png_bytes(3, 3)))
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(ImageBounds::UNBOUNDED);
    let base = mock_server.uri();
    let timeout = Duration::from_secs(5);

    assert!(matches!(
        fetcher.fetch(&format!("{}/busy.png", base), timeout).await,
        FetchOutcome::PermanentFailure { .. }
    ));
    assert!(matches!(
        fetcher.fetch(&format!("{}/limited.png", base), timeout).await,
        FetchOutcome::PermanentFailure { .. }
    ));
    assert!(fetcher
        .fetch(&format!("{}/missing.png", base), timeout)
        .await
        .is_success());
}

#[tokio::test]
async fn test_fetch_connection_refused_is_retryable() {
    // Bind then release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let fetcher = create_fetcher(ImageBounds::UNBOUNDED);
    let outcome = fetcher
        .fetch(&format!("http://127.0.0.1:{}/x.png", port), Duration::from_secs(2))
        .await;

    assert!(matches!(outcome, FetchOutcome::RetryableFailure { .. }));
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private.png"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(2, 2)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private.png"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("X-Api-Key".to_string(), "secret".to_string());
    let client = build_http_client(&headers).unwrap();
    let fetcher = HttpFetcher::new(client, ImageBounds::UNBOUNDED);

    let outcome = fetcher
        .fetch(&format!("{}/private.png", mock_server.uri()), Duration::from_secs(5))
        .await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_search_returns_url_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "red cats"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "# two results\nhttps://img.test/1.png\n\nhttps://img.test/2.png\n",
        ))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&BTreeMap::new()).unwrap();
    let source = HttpListSource::new(client, &format!("{}/search", mock_server.uri())).unwrap();

    let urls = source.search("red cats").await.unwrap();
    assert_eq!(urls, vec!["https://img.test/1.png", "https://img.test/2.png"]);
}

#[tokio::test]
async fn test_search_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&BTreeMap::new()).unwrap();
    let source =
        HttpListSource::new(client.clone(), &format!("{}/search", mock_server.uri())).unwrap();
    assert!(matches!(
        source.search("cats").await,
        Err(SearchError::Status { status: 500, .. })
    ));

    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let offline = HttpListSource::new(client, &format!("http://127.0.0.1:{}/search", port)).unwrap();
    assert!(matches!(
        offline.search("cats").await,
        Err(SearchError::Connectivity { .. })
    ));
}

/// Render sink collecting urls
#[derive(Default)]
struct CollectingSink {
    urls: Vec<String>,
}

impl RenderSink for CollectingSink {
    fn render(&mut self, _first_index: usize, images: &[FetchedImage]) {
        self.urls.extend(images.iter().map(|i| i.url.clone()));
    }
}

fn create_test_config(endpoint: &str, save_dir: &Path) -> Config {
    parse_config(&format!(
        r#"
[fetch]
timeout-ms = 500
max-retry-depth = 2

[layout]
images-per-row = 3
rows = 1

[thumbnail]
max-width = 16

[save]
directory = '{}'
max-width = 8

[search]
endpoint = "{}"
"#,
        save_dir.display(),
        endpoint
    ))
    .expect("Failed to parse test config")
}

#[tokio::test]
async fn test_full_session_backfills_and_saves() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Search results: a good image, a flaky one, an HTML page and a spare
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "{0}/a.png\n{0}/flaky.png\n{0}/page.html\n{0}/spare.png\n",
            base_url
        )))
        .mount(&mock_server)
        .await;

    mount_png(&mock_server, "/a.png", 64, 32).await;
    mount_png(&mock_server, "/spare.png", 32, 32).await;

    // First hit on the flaky image times out, later ones succeed
    Mock::given(method("GET"))
        .and(path("/flaky.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(20, 40))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_png(&mock_server, "/flaky.png", 20, 40).await;

    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let save_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&format!("{}/search", base_url), save_dir.path());

    let mut session = SearchSession::open_http(&config, "anything")
        .await
        .expect("Failed to open session");
    let mut sink = CollectingSink::default();

    let added = session.show_more(&mut sink).await.unwrap();

    // a.png + spare.png (backfilling the HTML page) + flaky.png on retry
    assert_eq!(added, 3);
    let mut shown = sink.urls.clone();
    shown.sort();
    assert_eq!(
        shown,
        vec![
            format!("{}/a.png", base_url),
            format!("{}/flaky.png", base_url),
            format!("{}/spare.png", base_url),
        ]
    );
    assert!(session
        .gallery()
        .images()
        .iter()
        .all(|image| image.thumbnail.width() <= 16));

    let index = session
        .gallery()
        .images()
        .iter()
        .position(|image| image.url.ends_with("/a.png"))
        .unwrap();
    session.toggle(index).unwrap();

    let report = session.close();
    assert_eq!(report.saved.len(), 1);
    let saved = image::open(&report.saved[0]).unwrap();
    assert_eq!(saved.dimensions(), (8, 4));
}

#[tokio::test]
async fn test_session_exhausts_when_host_serves_error_pages() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down.png"))
        .respond_with(
            ResponseTemplate::new(503).set_body_string("<html>Service Unavailable</html>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let save_dir = tempfile::tempdir().unwrap();
    let mut config = parse_config(&format!(
        r#"
[fetch]
max-retry-depth = 2

[layout]
images-per-row = 2

[save]
directory = '{}'
"#,
        save_dir.path().display()
    ))
    .unwrap();
    config.search.init_urls = vec![format!("{}/down.png", mock_server.uri())];

    let mut session = SearchSession::open_http(&config, "anything").await.unwrap();
    let mut sink = CollectingSink::default();

    assert_eq!(session.show_more(&mut sink).await.unwrap(), 0);
    assert!(!session.has_more());
    assert_eq!(session.show_more(&mut sink).await.unwrap(), 0);
    assert!(sink.urls.is_empty());
}

#[tokio::test]
async fn test_large_decode_does_not_time_out_other_fetches() {
    let mock_server = MockServer::start().await;
    mount_png(&mock_server, "/big.png", 2500, 2500).await;
    Mock::given(method("GET"))
        .and(path("/small.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(4, 4))
                .set_delay(Duration::from_millis(30)),
        )
        .mount(&mock_server)
        .await;

    let fetcher: Arc<dyn Fetcher> = Arc::new(create_fetcher(ImageBounds::new(Some(100), Some(100))));
    let big = format!("{}/big.png", mock_server.uri());
    let small = format!("{}/small.png", mock_server.uri());
    let mut orchestrator = BatchOrchestrator::new(
        vec![big.clone(), small.clone()]
            .into_iter()
            .collect::<PendingQueue>(),
        fetcher,
        ConnectionBudget::open(2).unwrap(),
        RetryPolicy {
            max_retry_depth: 0,
            timeout: Duration::from_millis(400),
        },
    );

    let batch = orchestrator.process_batch(2).await.unwrap();

    assert_eq!(batch.stats.requeued, 0);
    assert!(orchestrator.queue().is_empty());
    assert_eq!(batch.images[0].url, small, "the small image finishes first");
    assert_eq!(batch.len(), 2);
}
