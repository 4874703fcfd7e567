//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Forming batches from the scheduler's frontier
//! - Running fetch, classification and link extraction on a bounded worker pool
//! - Recording classifications and feeding discovered links back to the frontier
//!
//! A [`CrawlSession`] owns everything one crawl needs, so any number of crawls
//! can run side by side.

use crate::crawler::fetcher::{fetch_url, FetchedPage};
use crate::crawler::links::extract_links;
use crate::crawler::scheduler::{CrawlLimits, FrontierEntry, Scheduler, VisitedSet};
use crate::output::CrawlStats;
use crate::rules::{classify, Classification, Rule};
use crate::state::PageState;
use crate::ScoutError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// Batches between two progress reports
const PROGRESS_INTERVAL: usize = 10;

/// Classification recorded for a visited URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "isProduct")]
    pub is_product: bool,

    /// Label of the matching rule
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Normalized text of the extracted fragment
    pub text: Option<String>,
}

impl From<Classification> for ClassificationResult {
    fn from(classification: Classification) -> Self {
        let text = classification.text().map(str::to_string);
        Self {
            is_product: true,
            kind: Some(classification.kind),
            text,
        }
    }
}

/// Classification results keyed by URL
pub type CrawlResult = BTreeMap<String, ClassificationResult>;

/// Everything a finished (or interrupted) crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub start_url: String,
    pub results: CrawlResult,
    pub stats: CrawlStats,
}

/// What a worker found out about one URL
#[derive(Debug)]
struct PageOutcome {
    entry: FrontierEntry,
    state: PageState,
    classification: Option<Classification>,
    links: Vec<String>,
}

/// Read-only state shared by all workers of a session
struct WorkerContext {
    client: Client,
    rule: Arc<Rule>,
    visited: Arc<VisitedSet>,
    delay: Duration,
}

/// State of one crawl
///
/// The session outlives the future returned by [`CrawlSession::run`]. When that
/// future is dropped part-way (for example on Ctrl-C), the results gathered so
/// far remain available through [`CrawlSession::report`].
pub struct CrawlSession {
    start_url: String,
    scheduler: Scheduler,
    worker: Arc<WorkerContext>,

    /// Worker pool gate; lives as long as the session
    workers: Arc<Semaphore>,

    results: CrawlResult,
    stats: CrawlStats,
    started: Option<Instant>,
}

impl CrawlSession {
    /// Creates a new session seeded with `start_url`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used by every worker
    /// * `start_url` - Absolute URL the crawl starts from
    /// * `rule` - Detection rule tree
    /// * `limits` - Page quota, depth limit and worker count
    /// * `delay` - Pause each worker takes after a successful fetch
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSession)` - Session ready to run
    /// * `Err(ScoutError)` - `start_url` is not an absolute URL
    pub fn new(
        client: Client,
        start_url: &str,
        rule: Arc<Rule>,
        limits: CrawlLimits,
        delay: Duration,
    ) -> Result<Self, ScoutError> {
        let start = Url::parse(start_url)?;
        let start_url = start.to_string();

        let scheduler = Scheduler::new(&start_url, limits);
        let worker = Arc::new(WorkerContext {
            client,
            rule,
            visited: scheduler.visited(),
            delay,
        });

        Ok(Self {
            start_url,
            scheduler,
            worker,
            workers: Arc::new(Semaphore::new(limits.max_workers.max(1))),
            results: CrawlResult::new(),
            stats: CrawlStats::default(),
            started: None,
        })
    }

    /// Runs the crawl loop until the frontier is empty or the quota is used up
    ///
    /// 1. Drain a batch from the scheduler (URLs are marked visited here)
    /// 2. Dispatch every entry to a worker: fetch, classify, extract links
    /// 3. Record each outcome as it completes
    /// 4. Repeat
    pub async fn run(&mut self) {
        self.started.get_or_insert_with(Instant::now);
        tracing::info!("Starting crawl of {}", self.start_url);

        let mut batches = 0usize;
        while !self.scheduler.is_finished() {
            let batch = self.scheduler.next_batch();
            if batch.is_empty() {
                continue;
            }

            tracing::debug!(
                "Dispatching batch of {} (frontier: {}, visited: {})",
                batch.len(),
                self.scheduler.frontier_size(),
                self.scheduler.visited_count()
            );

            let mut tasks = JoinSet::new();
            for entry in batch {
                let Ok(permit) = Arc::clone(&self.workers).acquire_owned().await else {
                    tracing::error!("Worker pool closed, stopping crawl");
                    return;
                };
                tasks.spawn(process_page(Arc::clone(&self.worker), entry, permit));
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(outcome) => self.record(outcome),
                    Err(e) => {
                        tracing::error!("Worker task failed: {}", e);
                        self.stats.record_state(PageState::Failed);
                    }
                }
            }

            batches += 1;
            if batches % PROGRESS_INTERVAL == 0 {
                let stats = self.snapshot_stats();
                tracing::info!(
                    "Progress: {} pages visited, {} products, {} in frontier, {:.2} pages/sec",
                    stats.visited,
                    stats.classified,
                    self.scheduler.frontier_size(),
                    stats.pages_per_second()
                );
            }
        }

        let stats = self.snapshot_stats();
        tracing::info!(
            "Crawl of {} completed: {} pages visited, {} products in {:?}",
            self.start_url,
            stats.visited,
            stats.classified,
            stats.elapsed
        );
    }

    /// Runs the crawl until it completes or `shutdown` resolves
    ///
    /// In-flight workers are abandoned on shutdown; their URLs stay counted
    /// as visited.
    ///
    /// # Returns
    ///
    /// `true` if the crawl was interrupted
    pub async fn run_until<F>(&mut self, shutdown: F) -> bool
    where
        F: Future<Output = ()>,
    {
        let interrupted = tokio::select! {
            _ = self.run() => false,
            _ = shutdown => true,
        };

        if interrupted {
            tracing::warn!(
                "Crawl of {} interrupted, keeping {} results gathered so far",
                self.start_url,
                self.results.len()
            );
        }
        interrupted
    }

    /// Folds one worker outcome into the session
    fn record(&mut self, outcome: PageOutcome) {
        let PageOutcome {
            entry,
            state,
            classification,
            links,
        } = outcome;

        self.stats.record_state(state);

        if let Some(classification) = classification {
            tracing::info!("Product found ({}): {}", classification.kind, entry.url);
            // Each URL is dispatched once, so the first write is the only one
            self.results
                .entry(entry.url.clone())
                .or_insert_with(|| classification.into());
        }

        let added = self.scheduler.enqueue_links(entry.depth, links);
        self.stats.links_enqueued += added;
    }

    fn snapshot_stats(&self) -> CrawlStats {
        let mut stats = self.stats.clone();
        stats.visited = self.scheduler.visited_count();
        stats.classified = self.results.len();
        stats.elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        stats
    }

    /// Results and statistics gathered so far
    pub fn report(&self) -> CrawlReport {
        CrawlReport {
            start_url: self.start_url.clone(),
            results: self.results.clone(),
            stats: self.snapshot_stats(),
        }
    }

    /// Consumes the session, returning its results and statistics
    pub fn into_report(self) -> CrawlReport {
        let stats = self.snapshot_stats();
        CrawlReport {
            start_url: self.start_url,
            results: self.results,
            stats,
        }
    }
}

/// Fetches one URL, then classifies it and extracts its links
///
/// Failures are contained here: a failed fetch yields no classification and
/// no links.
async fn process_page(
    worker: Arc<WorkerContext>,
    entry: FrontierEntry,
    _permit: OwnedSemaphorePermit,
) -> PageOutcome {
    tracing::debug!("Fetching [depth {}]: {}", entry.depth, entry.url);

    let page = match fetch_url(&worker.client, &entry.url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", entry.url, e);
            return PageOutcome {
                state: e.page_state(),
                entry,
                classification: None,
                links: Vec::new(),
            };
        }
    };

    tracing::trace!("Fetched {} (HTTP {}, {} bytes)", entry.url, page.status_code, page.body.len());
    let (classification, links) = analyze_page(&page, &entry.url, &worker.rule);
    let links = links
        .into_iter()
        .filter(|link| !worker.visited.contains(link))
        .collect();

    if !worker.delay.is_zero() {
        tokio::time::sleep(worker.delay).await;
    }

    PageOutcome {
        state: if classification.is_some() {
            PageState::Classified
        } else {
            PageState::Unmatched
        },
        entry,
        classification,
        links,
    }
}

/// Parses a page body and runs the rule engine and link extractor on it
///
/// Kept synchronous: the parsed document never lives across an await point.
fn analyze_page(page: &FetchedPage, url: &str, rule: &Rule) -> (Option<Classification>, Vec<String>) {
    let document = page.parse();
    let classification = classify(&document, rule);

    let links = match Url::parse(url) {
        Ok(current) => extract_links(&document, &current),
        Err(e) => {
            tracing::debug!("Cannot extract links from {}: {}", url, e);
            Vec::new()
        }
    };

    (classification, links)
}

/// Crawls a site from `start_url` and classifies every visited page
///
/// Convenience wrapper around [`CrawlSession`] for callers that do not need
/// to interrupt the crawl.
///
/// # Example
///
/// ```no_run
/// use product_scout::crawler::{crawl, CrawlLimits};
/// use product_scout::rules::Rule;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rule = Rule::from_value(&serde_json::json!({
///     "condition": {"tag": "meta", "attribute": "property", "value": "og:type", "content": "product"},
///     "type": "product",
///     "extract": {"from_tag": "h1"}
/// }));
/// let limits = CrawlLimits { max_pages: 100, max_depth: 3, max_workers: 4 };
///
/// let report = crawl(
///     reqwest::Client::new(),
///     "https://shop.example.com/catalog/",
///     Arc::new(rule),
///     limits,
///     Duration::from_secs(1),
/// )
/// .await?;
/// println!("{} products", report.results.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    client: Client,
    start_url: &str,
    rule: Arc<Rule>,
    limits: CrawlLimits,
    delay: Duration,
) -> Result<CrawlReport, ScoutError> {
    let mut session = CrawlSession::new(client, start_url, rule, limits, delay)?;
    session.run().await;
    Ok(session.into_report())
}
