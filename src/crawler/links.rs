//! Link extraction for the crawl frontier
//!
//! Only anchors whose `href` shares the current page's path prefix are
//! followed. This keeps the crawl inside the section of the site it started
//! in without a strict same-host check.

use crate::rules::{Document, Element};
use url::Url;

/// Extracts same-section links from a parsed page
///
/// # Link Selection Rules
///
/// - The base path is the path of `current_url`; the root path `/` counts as
///   empty, in which case every anchor is kept
/// - An anchor is kept when its `href` contains the base path, ignoring case,
///   either as escaped in `current_url` or percent-decoded
/// - Kept hrefs are resolved against the origin (scheme, host and port) of
///   `current_url`
/// - Results that are not HTTP(S) URLs are dropped
///
/// Duplicate hrefs produce duplicate entries; deduplication is left to the
/// scheduler.
///
/// # Example
///
/// ```
/// use product_scout::crawler::extract_links;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/cat/item1">1</a><a href="/other/item2">2</a>"#);
/// let current = Url::parse("http://example.test/cat/").unwrap();
/// assert_eq!(extract_links(&html, &current), vec!["http://example.test/cat/item1"]);
/// ```
pub fn extract_links<D: Document>(document: &D, current_url: &Url) -> Vec<String> {
    let base_paths = base_paths(current_url);

    let Some(origin) = origin_of(current_url) else {
        tracing::debug!("No usable origin for {}, skipping link extraction", current_url);
        return Vec::new();
    };

    document
        .elements_by_tag("a")
        .iter()
        .filter_map(|anchor| anchor.attr("href"))
        .filter(|href| {
            let href = href.to_lowercase();
            base_paths.iter().any(|base| href.contains(base.as_str()))
        })
        .filter_map(|href| resolve_link(&href, &origin))
        .map(|resolved| resolved.to_string())
        .collect()
}

/// Lowercased forms of the page path an href must contain
///
/// The path is kept as the URL parser escaped it and, when that differs, also
/// percent-decoded, so hrefs written either way match. The root path yields
/// a single empty string.
fn base_paths(current_url: &Url) -> Vec<String> {
    let path = current_url.path();
    if path == "/" {
        return vec![String::new()];
    }

    let mut paths = vec![path.to_lowercase()];
    if let Ok(decoded) = urlencoding::decode(path) {
        let decoded = decoded.to_lowercase();
        if decoded != paths[0] {
            paths.push(decoded);
        }
    }
    paths
}

/// Scheme, host and port of `url` as a base for resolving hrefs
fn origin_of(url: &Url) -> Option<Url> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Url::parse(&origin.ascii_serialization()).ok()
}

/// Resolves an href against the origin, keeping only HTTP(S) results
fn resolve_link(href: &str, origin: &Url) -> Option<Url> {
    let href = href.trim();

    match origin.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
