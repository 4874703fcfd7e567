//! State tracking for crawled pages
//!
//! This module records the final outcome of every page a crawl visits.

mod page_state;

pub use page_state::PageState;
