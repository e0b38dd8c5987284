//! Integration tests for `PageClient` and `ImageDownloader`.
//!
//! Each test stands up a local `wiremock` server, so no real network
//! traffic is made.

use pcat_core::ImageSink;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pcat_scraper::{parse_product_page, ImageDownloader, PageClient, ScraperError};

fn test_client() -> PageClient {
    PageClient::new(5, "pcat-test/0.1", 0, 0).expect("failed to build test PageClient")
}

const PRODUCT_HTML: &str = r#"<html><body>
<span id="productTitle">Egyptian Cotton Sheet Set</span>
<span class="a-icon-alt">4.5 out of 5 stars</span>
<span class="a-price"><span class="a-offscreen">$49.99</span></span>
</body></html>"#;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_returns_html_and_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B08M9SMVSG"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_HTML))
        .mount(&server)
        .await;

    let url = format!("{}/dp/B08M9SMVSG", server.uri());
    let page = test_client().fetch_page(&url).await.expect("fetch page");

    assert_eq!(page.final_url, url);
    let parsed = parse_product_page(&page.html, &page.final_url).expect("parse page");
    assert_eq!(parsed.attributes.price, Some(49.99));
    assert_eq!(parsed.attributes.rating, Some(4.5));
}

#[tokio::test]
async fn fetch_page_follows_redirects() {
    let server = MockServer::start().await;
    let target = format!("{}/dp/B08M9SMVSG", server.uri());
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", target.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dp/B08M9SMVSG"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_HTML))
        .mount(&server)
        .await;

    let page = test_client()
        .fetch_page(&format!("{}/short", server.uri()))
        .await
        .expect("fetch page");

    assert_eq!(page.final_url, target);
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let result = test_client().fetch_page(&server.uri()).await;

    match result {
        Err(ScraperError::RateLimited {
            retry_after_secs, ..
        }) => assert_eq!(retry_after_secs, 30),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn not_found_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_client().fetch_page(&server.uri()).await;

    assert!(matches!(result, Err(ScraperError::NotFound { .. })));
}

#[tokio::test]
async fn server_error_is_retried_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = PageClient::new(5, "pcat-test/0.1", 2, 0).expect("client");
    let result = client.fetch_page(&server.uri()).await;

    assert!(matches!(
        result,
        Err(ScraperError::UnexpectedStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn forbidden_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = PageClient::new(5, "pcat-test/0.1", 3, 0).expect("client");
    let result = client.fetch_page(&server.uri()).await;

    assert!(matches!(
        result,
        Err(ScraperError::UnexpectedStatus { status: 403, .. })
    ));
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[tokio::test]
async fn image_downloader_fetches_and_saves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/main.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let sink = ImageDownloader::new(test_client(), dir.path());
    let image = sink
        .fetch(&format!("{}/images/main.png", server.uri()))
        .await
        .expect("fetch image");
    assert_eq!(image.extension(), ".png");

    let local = sink.save("AMZ-B08M9SMVSG", 0, &image).await.expect("save");
    assert!(local.ends_with("AMZ-B08M9SMVSG.png"));
    assert_eq!(std::fs::read(local).expect("read back"), image.bytes);
}
