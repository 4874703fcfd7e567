use crate::storage::traits::{ResultStore, StoreResult};
use crate::storage::ProductCollection;
use serde_json::error::Category;
use std::path::{Path, PathBuf};

/// Result store backed by a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for JsonFileStore {
    fn load(&self) -> StoreResult<ProductCollection> {
        if !self.path.exists() {
            tracing::debug!("{} does not exist yet, starting empty", self.path.display());
            return Ok(ProductCollection::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(collection) => Ok(collection),
            // Only text that is not JSON at all is discarded; JSON of the wrong
            // shape is an error so the file is never overwritten
            Err(e) if matches!(e.classify(), Category::Syntax | Category::Eof) => {
                tracing::warn!(
                    "Ignoring unreadable results file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(ProductCollection::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the collection through a temporary file, so an interrupted
    /// write never truncates the previous results
    fn save(&self, collection: &ProductCollection) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut content = serde_json::to_string_pretty(collection)?;
        content.push('\n');

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            "Saved {} sources to {}",
            collection.sources.len(),
            self.path.display()
        );
        Ok(())
    }
}
