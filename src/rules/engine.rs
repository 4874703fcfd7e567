//! Rule evaluation and value extraction
//!
//! Evaluation is a depth-first, left-to-right walk of the rule tree. Groups
//! short-circuit, so children after the first match are never looked at.

use crate::rules::document::{is_multi_valued, Document, Element};
use crate::rules::types::{Condition, ExtractSpec, Predicate, Rule, TagPredicate, TextMatch};

/// Outcome of a matching predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Label of the predicate that matched
    pub kind: String,

    /// Extracted fragment, when the predicate has an extraction spec and an
    /// element qualified
    pub extraction: Option<Extraction>,
}

impl Classification {
    /// Normalized text of the extracted fragment, if any
    pub fn text(&self) -> Option<&str> {
        self.extraction.as_ref().map(|e| e.text.as_str())
    }
}

/// A fragment pulled out of a matching page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Serialized element
    pub markup: String,

    /// Whitespace-normalized visible text of the element
    pub text: String,
}

/// Classifies a document against a rule tree
///
/// Returns the result of the first predicate that matches, or `None` when
/// nothing matches. Malformed rule clauses count as "no match".
pub fn classify<D: Document>(document: &D, rule: &Rule) -> Option<Classification> {
    match rule {
        Rule::Or(children) => children.iter().find_map(|child| classify(document, child)),
        Rule::Predicate(predicate) => classify_predicate(document, predicate),
        Rule::Malformed(reason) => {
            tracing::trace!("Skipping malformed rule: {}", reason);
            None
        }
    }
}

fn classify_predicate<D: Document>(document: &D, predicate: &Predicate) -> Option<Classification> {
    if !evaluate_condition(document, &predicate.condition) {
        return None;
    }

    let extraction = predicate
        .extract
        .as_ref()
        .and_then(|spec| extract(document, spec));

    Some(Classification {
        kind: predicate.kind.clone(),
        extraction,
    })
}

/// Evaluates a condition tree against a document
pub fn evaluate_condition<D: Document>(document: &D, condition: &Condition) -> bool {
    match condition {
        Condition::And(children) => children.iter().all(|c| evaluate_condition(document, c)),
        Condition::Or(children) => children.iter().any(|c| evaluate_condition(document, c)),
        Condition::Tag(predicate) => evaluate_tag(document, predicate),
        Condition::Malformed(_) => false,
    }
}

fn evaluate_tag<D: Document>(document: &D, predicate: &TagPredicate) -> bool {
    let elements = document.elements_by_tag(&predicate.tag);

    if predicate.exists {
        return !elements.is_empty();
    }

    elements
        .iter()
        .any(|element| element_satisfies(element, predicate))
}

/// All supplied checks must hold on the same element
fn element_satisfies<E: Element>(element: &E, predicate: &TagPredicate) -> bool {
    // With `attribute` but no `value`, the attribute has to be absent
    let attribute_ok = match &predicate.attribute {
        Some(name) => element.attr(name) == predicate.value,
        None => true,
    };

    let content_ok = match &predicate.content {
        Some(expected) => element.attr("content").as_deref() == Some(expected.as_str()),
        None => true,
    };

    let text_ok = match &predicate.text {
        Some(TextMatch::Contains(needle)) => element.text().trim().contains(needle.as_str()),
        Some(TextMatch::NonEmpty(true)) => !element.text().trim().is_empty(),
        Some(TextMatch::NonEmpty(false)) | None => true,
    };

    attribute_ok && content_ok && text_ok
}

/// Extracts the first element selected by `spec`, in document order
///
/// The attribute filter applies only when both `attribute` and `value` are
/// given. Token-list attributes such as `class` also match on a single token.
pub fn extract<D: Document>(document: &D, spec: &ExtractSpec) -> Option<Extraction> {
    if spec.from_tag.is_empty() {
        return None;
    }

    let filter = match (&spec.attribute, &spec.value) {
        (Some(name), Some(value)) => Some((name.as_str(), value.as_str())),
        _ => None,
    };

    document
        .elements_by_tag(&spec.from_tag)
        .into_iter()
        .filter(|element| match filter {
            Some((name, value)) => attribute_matches(element, name, value),
            None => true,
        })
        .find(|element| match &spec.text_contains {
            Some(needle) => element.text().contains(needle.as_str()),
            None => true,
        })
        .map(|element| Extraction {
            markup: element.markup(),
            text: element.normalized_text(),
        })
}

fn attribute_matches<E: Element>(element: &E, name: &str, value: &str) -> bool {
    if element.attr(name).as_deref() == Some(value) {
        return true;
    }
    is_multi_valued(name) && element.has_token(name, value)
}
