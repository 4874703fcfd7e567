//! Document abstraction the rule engine evaluates against
//!
//! Production code runs on the `scraper` DOM; the traits keep the engine
//! independent of it so tests can observe which lookups the engine performs.

use scraper::{ElementRef, Html};

/// Attributes HTML treats as whitespace-separated token lists
const MULTI_VALUED_ATTRIBUTES: &[&str] = &[
    "class",
    "rel",
    "rev",
    "accept-charset",
    "headers",
    "accesskey",
    "dropzone",
];

/// A parsed document that can enumerate its elements by tag name
pub trait Document {
    type Element<'a>: Element
    where
        Self: 'a;

    /// Returns every element named `tag`, in document order
    fn elements_by_tag<'a>(&'a self, tag: &str) -> Vec<Self::Element<'a>>;
}

/// A single element of a parsed document
pub trait Element {
    /// Attribute value; token-list attributes are joined with single spaces
    fn attr(&self, name: &str) -> Option<String>;

    /// The element's text nodes, in document order
    fn text_chunks(&self) -> Vec<String>;

    /// The serialized element, including its own tag
    fn markup(&self) -> String;

    /// All descendant text concatenated as-is
    fn text(&self) -> String {
        self.text_chunks().concat()
    }

    /// Visible text with each text node trimmed, empty nodes dropped and the
    /// rest joined by a single space
    fn normalized_text(&self) -> String {
        self.text_chunks()
            .iter()
            .map(|chunk| chunk.trim())
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether one token of a token-list attribute equals `value`
    fn has_token(&self, name: &str, value: &str) -> bool {
        is_multi_valued(name)
            && self
                .attr(name)
                .map(|attr| attr.split_whitespace().any(|token| token == value))
                .unwrap_or(false)
    }
}

/// Returns true for attributes HTML treats as token lists
pub fn is_multi_valued(name: &str) -> bool {
    MULTI_VALUED_ATTRIBUTES.contains(&name)
}

impl Document for Html {
    type Element<'a> = ElementRef<'a>;

    fn elements_by_tag<'a>(&'a self, tag: &str) -> Vec<ElementRef<'a>> {
        self.tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().name() == tag)
            .collect()
    }
}

impl Element for ElementRef<'_> {
    fn attr(&self, name: &str) -> Option<String> {
        let raw = self.value().attr(name)?;
        if is_multi_valued(name) {
            Some(raw.split_whitespace().collect::<Vec<_>>().join(" "))
        } else {
            Some(raw.to_string())
        }
    }

    fn text_chunks(&self) -> Vec<String> {
        ElementRef::text(self).map(str::to_string).collect()
    }

    fn markup(&self) -> String {
        self.html()
    }
}
