//! End-to-end crawl tests
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full fetch, classify and follow cycle.

use crate::common::{forbid, html, limits, listing_page, product_page, product_rule, serve};
use product_scout::crawler::{crawl, CrawlSession};
use product_scout::state::PageState;
use reqwest::Client;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_product_pages_are_classified() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve(
        &server,
        "/shop/",
        listing_page(&["/shop/widget", "/shop/about", "/blog/post"]),
        1,
    )
    .await;
    serve(&server, "/shop/widget", product_page("Widget"), 1).await;
    serve(&server, "/shop/about", listing_page(&[]), 1).await;
    forbid(&server, "/blog/post").await;

    let report = crawl(
        Client::new(),
        &format!("{}/shop/", base_url),
        product_rule(),
        limits(100, 3, 4),
        Duration::ZERO,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.results.len(), 1);
    let widget = &report.results[&format!("{}/shop/widget", base_url)];
    assert!(widget.is_product);
    assert_eq!(widget.kind.as_deref(), Some("product"));
    assert_eq!(widget.text.as_deref(), Some("Widget"));

    assert_eq!(report.stats.visited, 3);
    assert_eq!(report.stats.classified, 1);
    assert_eq!(report.stats.count(PageState::Classified), 1);
    assert_eq!(report.stats.count(PageState::Unmatched), 2);
}

#[tokio::test]
async fn test_links_outside_base_path_are_not_followed() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/cat/",
        listing_page(&["/cat/item1", "/other/item2", "/CAT/Item3"]),
        1,
    )
    .await;
    serve(&server, "/cat/item1", listing_page(&[]), 1).await;
    serve(&server, "/CAT/Item3", listing_page(&[]), 1).await;
    forbid(&server, "/other/item2").await;

    let report = crawl(
        Client::new(),
        &format!("{}/cat/", server.uri()),
        product_rule(),
        limits(100, 3, 2),
        Duration::ZERO,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.stats.visited, 3);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_each_url_is_fetched_at_most_once() {
    let server = MockServer::start().await;

    // Every listing links to every other listing and to the same product
    let listing = listing_page(&["/?page=1", "/?page=2", "/?page=3", "/item", "/item"]);
    serve(&server, "/", listing, 4).await;
    serve(&server, "/item", product_page("Shared"), 1).await;

    let report = crawl(
        Client::new(),
        &server.uri(),
        product_rule(),
        limits(100, 5, 4),
        Duration::ZERO,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.stats.visited, 5);
    assert_eq!(report.results.len(), 1);
    assert!(report.results.contains_key(&format!("{}/item", server.uri())));
}

#[tokio::test]
async fn test_page_quota_bounds_fetches() {
    let server = MockServer::start().await;

    let hrefs: Vec<String> = (1..=20).map(|n| format!("/?page={}", n)).collect();
    let hrefs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(&hrefs)))
        .mount(&server)
        .await;

    let report = crawl(
        Client::new(),
        &server.uri(),
        product_rule(),
        limits(5, 5, 3),
        Duration::ZERO,
    )
    .await
    .expect("Crawl failed");

    let requests = server.received_requests().await.expect("Request recording disabled");
    assert_eq!(requests.len(), 5);
    assert_eq!(report.stats.visited, 5);
}

#[tokio::test]
async fn test_zero_page_quota_fetches_nothing() {
    let server = MockServer::start().await;
    forbid(&server, "/").await;

    let report = crawl(
        Client::new(),
        &server.uri(),
        product_rule(),
        limits(0, 5, 3),
        Duration::ZERO,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.stats.visited, 0);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_depth_limit_stops_descent() {
    let server = MockServer::start().await;

    serve(&server, "/d/", listing_page(&["/d/1/"]), 1).await;
    serve(&server, "/d/1/", listing_page(&["/d/1/2/"]), 1).await;
    serve(&server, "/d/1/2/", listing_page(&["/d/1/2/3/"]), 1).await;
    forbid(&server, "/d/1/2/3/").await;

    let report = crawl(
        Client::new(),
        &format!("{}/d/", server.uri()),
        product_rule(),
        limits(100, 2, 2),
        Duration::ZERO,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.stats.visited, 3);
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_the_crawl() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/",
        listing_page(&["/missing", "/broken", "/good"]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    serve(&server, "/good", product_page("Good"), 1).await;
    // "/missing" has no mock, so the server answers 404

    let report = crawl(
        Client::new(),
        &server.uri(),
        product_rule(),
        limits(100, 3, 3),
        Duration::ZERO,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.results.len(), 1);
    assert!(report.results.contains_key(&format!("{}/good", server.uri())));
    assert_eq!(report.stats.visited, 4);
    assert_eq!(report.stats.count(PageState::DeadLink), 1);
    assert_eq!(report.stats.count(PageState::Failed), 1);
    assert_eq!(report.stats.errors(), 2);
}

#[tokio::test]
async fn test_interrupted_crawl_keeps_partial_results() {
    let server = MockServer::start().await;

    let front = r#"<html><head><meta property="og:type" content="product"></head>
        <body><h1>Front</h1><a href="/slow/a">a</a><a href="/slow/b">b</a></body></html>"#;
    serve(&server, "/", front.to_string(), 1).await;
    Mock::given(method("GET"))
        .respond_with(html(listing_page(&[])).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let mut session = CrawlSession::new(
        Client::new(),
        &server.uri(),
        product_rule(),
        limits(100, 3, 2),
        Duration::ZERO,
    )
    .expect("Invalid start URL");

    let interrupted = session
        .run_until(tokio::time::sleep(Duration::from_millis(500)))
        .await;
    assert!(interrupted);

    let report = session.into_report();
    let front_url = format!("{}/", server.uri());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[&front_url].text.as_deref(), Some("Front"));
    assert_eq!(report.stats.visited, 3);
}

#[tokio::test]
async fn test_run_until_without_shutdown_completes() {
    let server = MockServer::start().await;
    serve(&server, "/", product_page("Only"), 1).await;

    let mut session = CrawlSession::new(
        Client::new(),
        &server.uri(),
        product_rule(),
        limits(100, 3, 2),
        Duration::ZERO,
    )
    .expect("Invalid start URL");

    let interrupted = session.run_until(std::future::pending::<()>()).await;
    assert!(!interrupted);
    assert_eq!(session.report().results.len(), 1);
}
