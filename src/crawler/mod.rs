//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with error classification
//! - Same-section link extraction
//! - Frontier scheduling under page, depth and worker limits
//! - Overall crawl coordination and classification of visited pages

mod coordinator;
mod fetcher;
mod links;
mod scheduler;

pub use coordinator::{crawl, ClassificationResult, CrawlReport, CrawlResult, CrawlSession};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchedPage};
pub use links::extract_links;
pub use scheduler::{CrawlLimits, FrontierEntry, Scheduler, VisitedSet};

use crate::config::{Config, SourceEntry};
use crate::ScoutError;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;

/// Crawls one configured source
///
/// This is the entry point used by the command line. It will:
/// 1. Look up the source's detection rules
/// 2. Seed a session with the source's root URL
/// 3. Run it under the configured limits until done or `shutdown` resolves
///
/// # Arguments
///
/// * `config` - The loaded configuration (crawler limits and delay)
/// * `source` - The source to crawl
/// * `client` - HTTP client shared by all sources
/// * `shutdown` - Resolves when the crawl should stop early
///
/// # Returns
///
/// * `Ok((CrawlReport, bool))` - Results so far and whether the crawl was interrupted
/// * `Err(ScoutError)` - The source could not be crawled at all
pub async fn crawl_source<F>(
    config: &Config,
    source: &SourceEntry,
    client: Client,
    shutdown: F,
) -> crate::Result<(CrawlReport, bool)>
where
    F: Future<Output = ()>,
{
    let rule = source
        .detection_rule()
        .cloned()
        .ok_or_else(|| ScoutError::MissingRules(source.name.clone()))?;

    let mut session = CrawlSession::new(
        client,
        &source.root_url,
        Arc::new(rule),
        CrawlLimits::from(&config.crawler),
        config.crawler.request_delay(),
    )?;

    let interrupted = session.run_until(shutdown).await;
    Ok((session.into_report(), interrupted))
}
