//! Storage traits and error types
//!
//! This module defines the trait interface for result stores and
//! associated error types.

use crate::storage::ProductCollection;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for result store implementations
///
/// A store holds one [`ProductCollection`]. Callers load it, merge new
/// results in and save it back.
pub trait ResultStore {
    /// Loads the stored collection
    ///
    /// A store that does not exist yet, or whose content is not parseable at
    /// all, yields an empty collection. Content that parses but does not have
    /// the shape of a collection is an error.
    fn load(&self) -> StoreResult<ProductCollection>;

    /// Replaces the stored collection
    fn save(&self, collection: &ProductCollection) -> StoreResult<()>;
}
