use product_scout::crawler::CrawlLimits;
use product_scout::rules::Rule;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Rule matching pages that declare `og:type = product`, extracting the `h1`
pub fn product_rule() -> Arc<Rule> {
    Arc::new(Rule::from_value(&json!({
        "condition": {"tag": "meta", "attribute": "property", "value": "og:type", "content": "product"},
        "type": "product",
        "extract": {"from_tag": "h1"}
    })))
}

pub fn limits(max_pages: usize, max_depth: u32, max_workers: usize) -> CrawlLimits {
    CrawlLimits {
        max_pages,
        max_depth,
        max_workers,
    }
}

/// A page linking to every href in `links`
pub fn listing_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!("<html><head><title>Listing</title></head><body>{}</body></html>", anchors)
}

/// A product page with the given heading
pub fn product_page(name: &str) -> String {
    format!(
        r#"<html><head><meta property="og:type" content="product"></head>
        <body><h1>  {}  </h1><p>In stock</p></body></html>"#,
        name
    )
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Serves `body` at `page_path` and expects exactly `times` requests for it
pub async fn serve(server: &MockServer, page_path: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Fails the test if `page_path` is ever requested
pub async fn forbid(server: &MockServer, page_path: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}
