//! Integration tests for product-scout
//!
//! These tests run real crawls against wiremock servers.

mod common;
mod crawl_tests;
mod source_tests;
