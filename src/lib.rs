//! Product-Scout: a rule-driven product page crawler
//!
//! This crate implements a breadth-first crawler that stays inside one section
//! of a site, classifies every page it visits with declarative detection rules,
//! and records which pages are product pages.

pub mod config;
pub mod crawler;
pub mod output;
pub mod rules;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Product-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("No detection rules configured for source '{0}'")]
    MissingRules(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse rules file {path}: {source}")]
    RulesFile {
        path: String,
        source: serde_json::Error,
    },
}

/// Result type alias for Product-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, crawl_source, ClassificationResult, CrawlReport, CrawlResult};
pub use rules::{classify, Classification, Rule};
pub use state::PageState;
