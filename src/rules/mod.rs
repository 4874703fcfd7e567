//! Product detection rules
//!
//! This module contains the declarative rule language used to classify pages:
//! - Rule and condition trees built from JSON-shaped configuration
//! - A document abstraction over the parsed HTML tree
//! - The evaluator that classifies a page and extracts a text fragment

mod document;
mod engine;
mod types;

pub use document::{Document, Element};
pub use engine::{classify, evaluate_condition, extract, Classification, Extraction};
pub use types::{Condition, ExtractSpec, Predicate, Rule, TagPredicate, TextMatch};
