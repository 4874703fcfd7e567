//! Crawl statistics
//!
//! Counters gathered by a crawl session, plus a printer for the end-of-run
//! summary on stdout.

use crate::state::PageState;
use std::collections::BTreeMap;
use std::time::Duration;

/// Counters for one crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    /// URLs dispatched to a worker (including any abandoned on interrupt)
    pub visited: usize,

    /// URLs with a positive classification
    pub classified: usize,

    /// New frontier entries created from discovered links
    pub links_enqueued: usize,

    /// Completed pages by final state
    pub pages_by_state: BTreeMap<PageState, usize>,

    /// Wall time spent crawling
    pub elapsed: Duration,
}

impl CrawlStats {
    /// Counts one completed page
    pub fn record_state(&mut self, state: PageState) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;
    }

    /// Number of completed pages in `state`
    pub fn count(&self, state: PageState) -> usize {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Pages that finished in an error state
    pub fn errors(&self) -> usize {
        self.pages_by_state
            .iter()
            .filter(|(state, _)| state.is_error())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.visited as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints statistics for one source to stdout in a formatted manner
///
/// # Arguments
///
/// * `source` - Name of the crawled source
/// * `stats` - The statistics to display
pub fn print_statistics(source: &str, stats: &CrawlStats) {
    println!("=== Crawl Statistics: {} ===\n", source);

    println!("Overview:");
    println!("  Pages visited: {}", stats.visited);
    println!("  Products found: {}", stats.classified);
    println!("  Links queued: {}", stats.links_enqueued);
    println!(
        "  Elapsed: {:.1}s ({:.2} pages/sec)",
        stats.elapsed.as_secs_f64(),
        stats.pages_per_second()
    );
    println!();

    let completed: usize = stats.pages_by_state.values().sum();
    if completed > 0 {
        println!("Pages by State:");
        for state in PageState::ALL {
            let count = stats.count(state);
            if count == 0 {
                continue;
            }
            let percentage = (count as f64 / completed as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", state, count, percentage);
        }
        println!();
    }

    let errors = stats.errors();
    let error_rate = if completed > 0 {
        (errors as f64 / completed as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Error Rate: {:.1}% ({} / {} pages failed)",
        error_rate, errors, completed
    );
}
