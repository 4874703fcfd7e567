//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - The breadth-first FIFO frontier of (URL, depth) entries
//! - The visited set shared with workers
//! - Batch formation under the page quota and depth limit

use crate::config::CrawlerConfig;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to fetch
    pub url: String,

    /// Number of links followed from the start URL
    pub depth: u32,
}

/// Limits applied to one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Page quota, checked when a batch is formed
    pub max_pages: usize,

    /// Entries deeper than this are never dispatched
    pub max_depth: u32,

    /// Batch size and number of concurrent workers
    pub max_workers: usize,
}

impl From<&CrawlerConfig> for CrawlLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            max_depth: config.max_depth,
            max_workers: config.max_workers,
        }
    }
}

/// URLs already dispatched in one crawl
///
/// Shared between the coordinator and its workers. `insert_if_new` is the
/// single critical section that guarantees each URL is fetched at most once.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` visited; returns false if it already was
    pub fn insert_if_new(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panicking worker cannot leave the set half-updated, so a poisoned
    // lock is still safe to use
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scheduler owns the frontier of one crawl
///
/// The scheduler coordinates:
/// - FIFO order, so pages are dispatched level by level within a batch
/// - Deduplication of queued and visited URLs
/// - The page quota and depth limit
pub struct Scheduler {
    /// Frontier queue of URLs to fetch
    frontier: VecDeque<FrontierEntry>,

    /// Every URL ever pushed to the frontier
    queued: HashSet<String>,

    /// URLs already dispatched to a worker
    visited: Arc<VisitedSet>,

    limits: CrawlLimits,
}

impl Scheduler {
    /// Creates a scheduler whose frontier holds `start_url` at depth 0
    pub fn new(start_url: &str, limits: CrawlLimits) -> Self {
        let mut frontier = VecDeque::new();
        frontier.push_back(FrontierEntry {
            url: start_url.to_string(),
            depth: 0,
        });

        Self {
            frontier,
            queued: HashSet::from([start_url.to_string()]),
            visited: Arc::new(VisitedSet::new()),
            limits,
        }
    }

    /// Drains the next batch of entries to dispatch
    ///
    /// Takes at most `max_workers` entries, skipping visited URLs and entries
    /// deeper than `max_depth`, and stops once the page quota is reached.
    /// Every returned URL has already been marked visited.
    pub fn next_batch(&mut self) -> Vec<FrontierEntry> {
        let mut batch = Vec::new();

        while batch.len() < self.limits.max_workers.max(1) && !self.quota_reached() {
            let Some(entry) = self.frontier.pop_front() else {
                break;
            };

            if entry.depth > self.limits.max_depth {
                tracing::trace!("Skipping {} at depth {}", entry.url, entry.depth);
                continue;
            }

            if !self.visited.insert_if_new(&entry.url) {
                continue;
            }

            batch.push(entry);
        }

        batch
    }

    /// Queues links discovered on a page at `parent_depth`
    ///
    /// Nothing is queued when the children would exceed `max_depth`. URLs that
    /// were visited or queued before are ignored.
    ///
    /// # Returns
    ///
    /// The number of new frontier entries
    pub fn enqueue_links<I>(&mut self, parent_depth: u32, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let depth = parent_depth + 1;
        if depth > self.limits.max_depth {
            return 0;
        }

        let mut added = 0;
        for url in links {
            if self.visited.contains(&url) || !self.queued.insert(url.clone()) {
                continue;
            }
            self.frontier.push_back(FrontierEntry { url, depth });
            added += 1;
        }
        added
    }

    /// True when the frontier is empty or the page quota is used up
    pub fn is_finished(&self) -> bool {
        self.frontier.is_empty() || self.quota_reached()
    }

    fn quota_reached(&self) -> bool {
        self.visited.len() >= self.limits.max_pages
    }

    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Handle to the visited set for workers
    pub fn visited(&self) -> Arc<VisitedSet> {
        Arc::clone(&self.visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_pages: usize, max_depth: u32, max_workers: usize) -> CrawlLimits {
        CrawlLimits {
            max_pages,
            max_depth,
            max_workers,
        }
    }

    fn urls(batch: &[FrontierEntry]) -> Vec<&str> {
        batch.iter().map(|e| e.url.as_str()).collect()
    }

    #[test]
    fn test_new_scheduler() {
        let scheduler = Scheduler::new("http://example.test/", limits(10, 2, 4));
        assert_eq!(scheduler.frontier_size(), 1);
        assert_eq!(scheduler.visited_count(), 0);
        assert!(!scheduler.is_finished());
    }

    #[test]
    fn test_first_batch_is_start_url() {
        let mut scheduler = Scheduler::new("http://example.test/", limits(10, 2, 4));
        let batch = scheduler.next_batch();

        assert_eq!(
            batch,
            vec![FrontierEntry {
                url: "http://example.test/".to_string(),
                depth: 0
            }]
        );
        assert_eq!(scheduler.visited_count(), 1);
        assert!(scheduler.is_finished());
    }

    #[test]
    fn test_batch_respects_worker_count() {
        let mut scheduler = Scheduler::new("http://example.test/", limits(100, 2, 2));
        scheduler.next_batch();
        scheduler.enqueue_links(0, (1..=5).map(|i| format!("http://example.test/{}", i)));

        assert_eq!(scheduler.next_batch().len(), 2);
        assert_eq!(scheduler.next_batch().len(), 2);
        assert_eq!(scheduler.next_batch().len(), 1);
        assert!(scheduler.is_finished());
    }

    #[test]
    fn test_batch_respects_page_quota() {
        let mut scheduler = Scheduler::new("http://example.test/", limits(3, 2, 10));
        scheduler.next_batch();
        scheduler.enqueue_links(0, (1..=5).map(|i| format!("http://example.test/{}", i)));

        let batch = scheduler.next_batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(scheduler.visited_count(), 3);
        assert!(scheduler.is_finished());
        assert!(scheduler.next_batch().is_empty());
    }

    #[test]
    fn test_zero_quota_dispatches_nothing() {
        let mut scheduler = Scheduler::new("http://example.test/", limits(0, 2, 4));
        assert!(scheduler.is_finished());
        assert!(scheduler.next_batch().is_empty());
        assert_eq!(scheduler.visited_count(), 0);
    }

    #[test]
    fn test_links_beyond_max_depth_not_queued() {
        let mut scheduler = Scheduler::new("http://example.test/", limits(10, 1, 4));
        scheduler.next_batch();

        assert_eq!(scheduler.enqueue_links(0, vec!["http://example.test/a".to_string()]), 1);
        assert_eq!(scheduler.enqueue_links(1, vec!["http://example.test/b".to_string()]), 0);

        let batch = scheduler.next_batch();
        assert_eq!(urls(&batch), vec!["http://example.test/a"]);
        assert!(batch.iter().all(|e| e.depth <= 1));
    }

    #[test]
    fn test_duplicate_links_queued_once() {
        let mut scheduler = Scheduler::new("http://example.test/", limits(10, 3, 4));
        scheduler.next_batch();

        let added = scheduler.enqueue_links(
            0,
            vec![
                "http://example.test/a".to_string(),
                "http://example.test/a".to_string(),
                "http://example.test/".to_string(),
            ],
        );
        assert_eq!(added, 1);

        scheduler.next_batch();
        assert_eq!(
            scheduler.enqueue_links(1, vec!["http://example.test/a".to_string()]),
            0
        );
        assert_eq!(scheduler.visited_count(), 2);
    }

    #[test]
    fn test_fifo_order() {
        let mut scheduler = Scheduler::new("http://example.test/", limits(10, 3, 10));
        scheduler.next_batch();
        scheduler.enqueue_links(0, vec!["http://example.test/a".to_string(), "http://example.test/b".to_string()]);
        scheduler.enqueue_links(1, vec!["http://example.test/c".to_string()]);

        let batch = scheduler.next_batch();
        assert_eq!(
            urls(&batch),
            vec!["http://example.test/a", "http://example.test/b", "http://example.test/c"]
        );
    }

    #[test]
    fn test_visited_set_check_and_insert() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(visited.insert_if_new("http://example.test/"));
        assert!(!visited.insert_if_new("http://example.test/"));
        assert!(visited.contains("http://example.test/"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_visited_set_concurrent_inserts() {
        let visited = Arc::new(VisitedSet::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| visited.insert_if_new(&format!("http://example.test/{}", i)))
                        .count()
                })
            })
            .collect();

        let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(inserted, 100);
        assert_eq!(visited.len(), 100);
    }
}
