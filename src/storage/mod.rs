//! Storage module for persisting crawl results
//!
//! This module handles everything that survives a run, including:
//! - The JSON results file with product links per source
//! - Merging a fresh crawl into previously saved results
//! - Preserving keys written by other tools

mod json;
mod traits;

pub use json::JsonFileStore;
pub use traits::{ResultStore, StoreError, StoreResult};

use crate::crawler::CrawlResult;
use serde::{Deserialize, Serialize};

/// All saved results, one entry per source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCollection {
    #[serde(default)]
    pub sources: Vec<SourceProducts>,

    /// Top-level keys this crate does not know about, kept on save
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Product links found for one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceProducts {
    pub name: String,

    #[serde(default)]
    pub product_links: Vec<ProductLink>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One product page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLink {
    pub link: String,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

impl SourceProducts {
    pub fn new(name: impl Into<String>, product_links: Vec<ProductLink>) -> Self {
        Self {
            name: name.into(),
            product_links,
            extra: serde_json::Map::new(),
        }
    }

    /// Builds the entry for `name` from the positive results of a crawl
    ///
    /// Links are listed in URL order.
    pub fn from_crawl(name: impl Into<String>, results: &CrawlResult) -> Self {
        let product_links = results
            .iter()
            .filter(|(_, result)| result.is_product)
            .map(|(url, result)| ProductLink {
                link: url.clone(),
                kind: result.kind.clone(),
                text: result.text.clone(),
            })
            .collect();

        Self::new(name, product_links)
    }
}

impl ProductCollection {
    pub fn find(&self, name: &str) -> Option<&SourceProducts> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Replaces the product links of the entry with the same name, or
    /// appends `entry` when there is none
    ///
    /// Other keys of an existing entry are left alone.
    pub fn update_or_add(&mut self, entry: SourceProducts) {
        match self.sources.iter_mut().find(|s| s.name == entry.name) {
            Some(existing) => existing.product_links = entry.product_links,
            None => self.sources.push(entry),
        }
    }
}

/// Merges one source's crawl results into the store
///
/// # Arguments
///
/// * `store` - Where results are kept
/// * `name` - The source name
/// * `results` - Everything the crawl classified
///
/// # Returns
///
/// * `Ok(usize)` - Number of product links saved for the source
/// * `Err(StoreError)` - The store could not be read or written
pub fn save_source_results<S: ResultStore + ?Sized>(
    store: &S,
    name: &str,
    results: &CrawlResult,
) -> StoreResult<usize> {
    let entry = SourceProducts::from_crawl(name, results);
    let saved = entry.product_links.len();

    let mut collection = store.load()?;
    collection.update_or_add(entry);
    store.save(&collection)?;

    tracing::info!("Saved {} product links for {}", saved, name);
    Ok(saved)
}
