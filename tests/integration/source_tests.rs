//! Configured-source tests: load a config, crawl a source, save its results

use crate::common::{listing_page, product_page, serve};
use product_scout::config::load_config;
use product_scout::crawler::crawl_source;
use product_scout::storage::{save_source_results, JsonFileStore, ResultStore};
use reqwest::Client;
use tempfile::TempDir;
use wiremock::MockServer;

const RULES_JSON: &str = r#"{
    "or": [
        {
            "condition": {"tag": "meta", "attribute": "property", "value": "og:type", "content": "product"},
            "type": "product",
            "extract": {"from_tag": "h1"}
        },
        {
            "condition": [
                {"tag": "div", "attribute": "class", "value": "price"},
                {"tag": "button", "text_contains": "Add to cart"}
            ],
            "type": "product-card",
            "extract": {"from_tag": "div", "attribute": "class", "value": "title"}
        }
    ]
}"#;

fn write_config(dir: &TempDir, root_url: &str, results_path: &str) -> std::path::PathBuf {
    std::fs::create_dir_all(dir.path().join("rules")).unwrap();
    std::fs::write(dir.path().join("rules").join("shop.json"), RULES_JSON).unwrap();

    let config = format!(
        r#"
[crawler]
max-pages = 50
max-depth = 3
max-workers = 4
request-delay-ms = 0

[user-agent]
crawler-name = "TestScout"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
results-path = "{}"

[[source]]
name = "shop"
root-url = "{}"
rules-file = "rules/shop.json"
"#,
        results_path, root_url
    );

    let path = dir.path().join("scout.toml");
    std::fs::write(&path, config).unwrap();
    path
}

#[tokio::test]
async fn test_configured_source_crawl_is_saved() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    serve(
        &server,
        "/catalog/",
        listing_page(&["/catalog/kettle", "/catalog/toaster", "/catalog/help"]),
        1,
    )
    .await;
    serve(&server, "/catalog/kettle", product_page("Kettle"), 1).await;
    serve(
        &server,
        "/catalog/toaster",
        r#"<html><body>
            <div class="card"><div class="title"> Toaster <b>2000</b> </div><div class="price">25</div></div>
            <button>Add to cart</button>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;
    serve(&server, "/catalog/help", listing_page(&[]), 1).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("product_links.json");
    let config_path = write_config(
        &dir,
        &format!("{}/catalog/", base_url),
        &results_path.display().to_string(),
    );

    let config = load_config(&config_path).expect("Config should load");
    let source = &config.sources[0];

    let (report, interrupted) =
        crawl_source(&config, source, Client::new(), std::future::pending::<()>())
            .await
            .expect("Crawl failed");
    assert!(!interrupted);

    // A previous run of another source is already on disk
    std::fs::write(
        &results_path,
        r#"{"sources": [{"name": "other", "product_links": []}]}"#,
    )
    .unwrap();

    let store = JsonFileStore::new(&results_path);
    let saved = save_source_results(&store, &source.name, &report.results).unwrap();
    assert_eq!(saved, 2);

    let collection = store.load().unwrap();
    assert_eq!(collection.sources.len(), 2);

    let shop = collection.find("shop").expect("Source not saved");
    let links: Vec<_> = shop
        .product_links
        .iter()
        .map(|l| (l.link.clone(), l.kind.clone(), l.text.clone()))
        .collect();
    assert_eq!(
        links,
        vec![
            (
                format!("{}/catalog/kettle", base_url),
                Some("product".to_string()),
                Some("Kettle".to_string()),
            ),
            (
                format!("{}/catalog/toaster", base_url),
                Some("product-card".to_string()),
                Some("Toaster 2000".to_string()),
            ),
        ]
    );
}

#[tokio::test]
async fn test_rerun_replaces_source_links() {
    let server = MockServer::start().await;
    serve(&server, "/catalog/", product_page("Landing"), 1).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("product_links.json");
    let config_path = write_config(
        &dir,
        &format!("{}/catalog/", server.uri()),
        &results_path.display().to_string(),
    );
    std::fs::write(
        &results_path,
        r#"{"sources": [{"name": "shop", "product_links": [
            {"link": "http://stale.test/x", "type": "product", "text": "Stale"}
        ]}]}"#,
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let (report, _) = crawl_source(
        &config,
        &config.sources[0],
        Client::new(),
        std::future::pending::<()>(),
    )
    .await
    .unwrap();

    let store = JsonFileStore::new(&results_path);
    save_source_results(&store, "shop", &report.results).unwrap();

    let collection = store.load().unwrap();
    assert_eq!(collection.sources.len(), 1);
    let links = &collection.sources[0].product_links;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].text.as_deref(), Some("Landing"));
}
