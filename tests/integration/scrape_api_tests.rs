//! Scrape provider adapter against a mock provider

use sale_pager::config::{ProviderSettings, ScrapeOptions};
use sale_pager::crawler::{FetchError, FetchRequest, PageFetcher, ScrapeApiFetcher};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> ProviderSettings {
    ProviderSettings {
        endpoint: server.uri(),
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
    }
}

fn request(url: &str) -> FetchRequest {
    FetchRequest::new(
        url,
        ScrapeOptions {
            wait_for_ms: 2500,
            only_main_content: false,
        },
    )
}

#[tokio::test]
async fn test_fetch_writes_markdown_and_returns_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "markdown": "# Sale\n\nCoat 40% OFF" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("page.md");
    let fetcher = ScrapeApiFetcher::new(&provider(&server)).unwrap();

    let bytes = fetcher
        .fetch(&request("https://x.test/sale"), &output)
        .await
        .expect("fetch failed");

    assert_eq!(bytes, "# Sale\n\nCoat 40% OFF".len() as u64);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "# Sale\n\nCoat 40% OFF"
    );

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["url"], "https://x.test/sale");
    assert_eq!(body["waitFor"], 2500);
    assert_eq!(body["onlyMainContent"], false);
    assert_eq!(body["formats"], json!(["markdown"]));
}

#[tokio::test]
async fn test_fetch_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("page.md");
    let fetcher = ScrapeApiFetcher::new(&provider(&server)).unwrap();

    let result = fetcher.fetch(&request("https://x.test/sale"), &output).await;

    match result {
        Err(FetchError::Status { status, body, .. }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "upstream down");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_fetch_reports_provider_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "blocked by target"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let fetcher = ScrapeApiFetcher::new(&provider(&server)).unwrap();

    let result = fetcher
        .fetch(&request("https://x.test/sale"), &dir.path().join("page.md"))
        .await;

    assert!(matches!(
        result,
        Err(FetchError::Provider { ref message, .. }) if message == "blocked by target"
    ));
}

#[tokio::test]
async fn test_fetch_without_markdown_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {}
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let fetcher = ScrapeApiFetcher::new(&provider(&server)).unwrap();

    let result = fetcher
        .fetch(&request("https://x.test/sale"), &dir.path().join("page.md"))
        .await;

    assert!(matches!(result, Err(FetchError::Provider { .. })));
}
