use crate::rules::Rule;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for product-scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched per source
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum link depth from the root URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of pages fetched concurrently
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Pause after each fetched page (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Reject malformed detection rules instead of treating them as non-matching
    #[serde(rename = "strict-rules")]
    pub strict_rules: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 777_777,
            max_depth: 10,
            max_workers: 10,
            request_timeout_secs: 10,
            request_delay_ms: 1000,
            strict_rules: false,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON file collecting product links per source
    #[serde(rename = "results-path")]
    pub results_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "product_links.json".to_string(),
        }
    }
}

/// A site to crawl together with its detection rules
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Unique name; results are stored under it
    pub name: String,

    /// Crawl seed
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Inline detection rule tree
    #[serde(default, rename = "product-detection")]
    pub product_detection: Option<Rule>,

    /// JSON file holding the detection rule tree, relative to the config file
    #[serde(default, rename = "rules-file")]
    pub rules_file: Option<String>,
}

impl SourceEntry {
    /// The detection rule tree; set for every source of a loaded config
    pub fn detection_rule(&self) -> Option<&Rule> {
        self.product_detection.as_ref()
    }
}
