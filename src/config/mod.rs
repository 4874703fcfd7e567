//! Configuration module for product-scout
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! including the detection rules of every configured source.
//!
//! # Example
//!
//! ```no_run
//! use product_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SourceEntry, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

// Re-export validation for settings changed after loading
pub use validation::{validate, validate_overrides};
