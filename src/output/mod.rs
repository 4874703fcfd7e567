//! Output module for crawl summaries
//!
//! This module handles:
//! - Counting page outcomes during a crawl
//! - Printing per-source statistics at the end of a run

pub mod stats;

pub use stats::{print_statistics, CrawlStats};
