//! End-to-end runs through the coordinator with the real provider adapter

use sale_pager::config::Settings;
use sale_pager::crawler::{run_scrape, RunMode};
use sale_pager::PagerError;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates settings pointing at the mock provider and a scratch directory
fn create_test_settings(server: &MockServer, root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.provider.endpoint = server.uri();
    settings.provider.api_key = Some("test-key".to_string());
    settings.provider.timeout_secs = 5;
    settings.output.dir = root.join("output");
    settings.output.log_dir = root.join("logs");
    settings.retailers.dir = root.join("retailers");
    std::fs::create_dir_all(&settings.retailers.dir).unwrap();
    settings
}

fn write_retailer(settings: &Settings, id: &str, content: &str) {
    std::fs::write(
        settings.retailers.dir.join(format!("{}.toml", id)),
        content,
    )
    .unwrap();
}

/// Serves `markdown` for scrape requests of `url`
async fn mock_page(server: &MockServer, url: &str, markdown: String) {
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(body_partial_json(json!({ "url": url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "markdown": markdown }
        })))
        .mount(server)
        .await;
}

async fn requested_urls(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            body["url"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_small_second_page_ends_category() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let settings = create_test_settings(&server, root.path());
    write_retailer(
        &settings,
        "x",
        r#"
sale-urls = ["https://x.test/sale"]
url-labels = []

[pagination]
max-pages = 3
param = "page"
"#,
    );

    mock_page(&server, "https://x.test/sale", "a".repeat(2000)).await;
    mock_page(&server, "https://x.test/sale?page=2", "b".repeat(300)).await;
    mock_page(&server, "https://x.test/sale?page=3", "c".repeat(2000)).await;

    let report = run_scrape(&settings, &RunMode::Retailer("x".to_string()))
        .await
        .expect("run failed");

    assert_eq!(
        requested_urls(&server).await,
        vec!["https://x.test/sale", "https://x.test/sale?page=2"]
    );
    assert_eq!(
        report.artifacts,
        vec![settings.output.dir.join("x_sale_p1.md")]
    );
    assert!(settings.output.dir.join("x_sale_p1.md").exists());
    assert!(!settings.output.dir.join("x_sale_p2.md").exists());
}

#[tokio::test]
async fn test_builtin_predicate_stops_on_page_without_discounts() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let settings = create_test_settings(&server, root.path());
    write_retailer(
        &settings,
        "secondhand",
        r#"
sale-urls = ["https://shop.test/sale/outer?sort=new"]

[pagination]
max-pages = 10

[pagination-overrides.outer]
stop-when = "no_discount"
"#,
    );

    let discounted = format!("{}\nJacket 30% OFF\n", "x".repeat(1000));
    let full_price = format!("{}\nJacket $200\n", "y".repeat(1000));
    mock_page(&server, "https://shop.test/sale/outer?sort=new", discounted).await;
    mock_page(&server, "https://shop.test/sale/outer?sort=new&page=2", full_price).await;

    let report = run_scrape(&settings, &RunMode::Retailer("secondhand".to_string()))
        .await
        .expect("run failed");

    // The page that fired the predicate is kept
    assert_eq!(
        report.artifacts,
        vec![
            settings.output.dir.join("secondhand_outer_p1.md"),
            settings.output.dir.join("secondhand_outer_p2.md"),
        ]
    );
    assert_eq!(requested_urls(&server).await.len(), 2);
}

#[tokio::test]
async fn test_all_mode_reports_missing_retailer_and_continues() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut settings = create_test_settings(&server, root.path());
    settings.retailers.order = vec!["missing".to_string(), "off".to_string(), "on".to_string()];
    write_retailer(
        &settings,
        "off",
        "enabled = false\nsale-urls = [\"https://off.test/sale\"]",
    );
    write_retailer(
        &settings,
        "on",
        "sale-urls = [\"https://on.test/sale\"]\n[pagination]\nmax-pages = 1",
    );
    mock_page(&server, "https://on.test/sale", "z".repeat(800)).await;

    let report = run_scrape(&settings, &RunMode::All)
        .await
        .expect("run failed");

    assert_eq!(report.artifacts, vec![settings.output.dir.join("on_sale_p1.md")]);
    assert_eq!(report.skipped, vec!["off"]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        PagerError::ConfigNotFound { .. }
    ));
    assert_eq!(requested_urls(&server).await, vec!["https://on.test/sale"]);
}

#[tokio::test]
async fn test_unknown_retailer_fails_run() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let settings = create_test_settings(&server, root.path());

    let result = run_scrape(&settings, &RunMode::Retailer("nobody".to_string())).await;

    assert!(matches!(result, Err(PagerError::ConfigNotFound { .. })));
}

#[tokio::test]
async fn test_product_mode_disables_main_content_filter() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let settings = create_test_settings(&server, root.path());
    mock_page(
        &server,
        "https://shop.test/product/boots-42",
        "Sizes: 40 41 42".to_string(),
    )
    .await;

    let report = run_scrape(
        &settings,
        &RunMode::Product("https://shop.test/product/boots-42".to_string()),
    )
    .await
    .expect("run failed");

    assert_eq!(
        report.artifacts,
        vec![settings.output.dir.join("product_shop_test_boots-42.md")]
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["onlyMainContent"], false);
    assert_eq!(body["waitFor"], 5000);
}

fn listing(products: &[&str]) -> String {
    let mut page = format!("# Coats\n\n{}\n", "Sale listing. ".repeat(40));
    for product in products {
        page.push_str(&format!("- [Coat]({})\n", product));
    }
    page
}

#[tokio::test]
async fn test_seen_before_stops_at_override_threshold() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let mut settings = create_test_settings(&server, root.path());
    let latest = root.path().join("latest.json");
    std::fs::write(
        &latest,
        json!({
            "products": [
                { "url": "https://shop.test/p/1" },
                { "url": "https://shop.test/p/2" },
                { "url": "https://shop.test/p/5" },
                { "url": "https://shop.test/p/6" },
                { "url": "https://shop.test/p/7" }
            ]
        })
        .to_string(),
    )
    .unwrap();
    settings.predicate.latest_path = Some(latest);
    write_retailer(
        &settings,
        "coats",
        r#"
sale-urls = ["https://shop.test/sale/coats"]

[pagination]
max-pages = 5

[pagination-overrides.coats]
stop-when = "seen_before"
threshold = 0.7
"#,
    );

    // Page 1: 2 of 4 known (50%, below 0.7); page 2: 3 of 4 known (75%)
    mock_page(
        &server,
        "https://shop.test/sale/coats",
        listing(&[
            "https://shop.test/p/1",
            "https://shop.test/p/2",
            "https://shop.test/p/3",
            "https://shop.test/p/4",
        ]),
    )
    .await;
    mock_page(
        &server,
        "https://shop.test/sale/coats?page=2",
        listing(&[
            "https://shop.test/p/5",
            "https://shop.test/p/6",
            "https://shop.test/p/7",
            "https://shop.test/p/8",
        ]),
    )
    .await;
    mock_page(
        &server,
        "https://shop.test/sale/coats?page=3",
        listing(&["https://shop.test/p/9"]),
    )
    .await;

    let report = run_scrape(&settings, &RunMode::Retailer("coats".to_string()))
        .await
        .expect("run failed");

    assert_eq!(
        requested_urls(&server).await,
        vec![
            "https://shop.test/sale/coats",
            "https://shop.test/sale/coats?page=2"
        ]
    );
    assert_eq!(
        report.artifacts,
        vec![
            settings.output.dir.join("coats_coats_p1.md"),
            settings.output.dir.join("coats_coats_p2.md"),
        ]
    );
}
