//! Rule tree types
//!
//! Detection rules arrive as JSON-shaped trees (inline TOML tables or a JSON
//! rules file). They are converted once, at configuration-load time, into the
//! closed enums below. Shapes that do not fit the grammar are kept as
//! `Malformed` variants so that a single bad clause only ever fails to match.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A node of the detection rule tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum Rule {
    /// Ordered alternatives, the first matching child wins
    Or(Vec<Rule>),

    /// Terminal classification rule
    Predicate(Predicate),

    /// A shape that is not part of the grammar; never matches
    Malformed(String),
}

/// Terminal rule pairing a condition with a classification label
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub condition: Condition,

    /// Classification label reported for matching pages (the `type` key)
    pub kind: String,

    pub extract: Option<ExtractSpec>,
}

/// A boolean condition over a parsed document
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Every child must hold
    And(Vec<Condition>),

    /// At least one child must hold
    Or(Vec<Condition>),

    /// Leaf check against all elements of one tag
    Tag(TagPredicate),

    /// A shape that is not part of the grammar; always false
    Malformed(String),
}

/// Leaf condition evaluated against all elements with a given tag name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPredicate {
    pub tag: String,

    /// `exists = true` turns the predicate into a plain existence check
    pub exists: bool,

    pub attribute: Option<String>,
    pub value: Option<String>,

    /// Expected value of the element's `content` attribute
    pub content: Option<String>,

    pub text: Option<TextMatch>,
}

/// The `text_contains` check of a tag predicate
#[derive(Debug, Clone, PartialEq)]
pub enum TextMatch {
    /// The trimmed element text must contain this substring
    Contains(String),

    /// `true` requires non-empty trimmed text, `false` is always satisfied
    NonEmpty(bool),
}

/// Selects the element whose markup and text are extracted from a matching page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractSpec {
    pub from_tag: String,
    pub attribute: Option<String>,
    pub value: Option<String>,
    pub text_contains: Option<String>,
}

impl From<Value> for Rule {
    fn from(value: Value) -> Self {
        Rule::from_value(&value)
    }
}

impl Rule {
    /// Builds a rule tree from its JSON representation
    ///
    /// An object with an `or` key is a group of alternatives; an object with
    /// both `condition` and `type` keys is a predicate. Anything else becomes
    /// [`Rule::Malformed`].
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Rule::Malformed(format!("rule must be an object, got {}", kind_of(value)));
        };

        if let Some(children) = obj.get("or") {
            return match children.as_array() {
                Some(items) => Rule::Or(items.iter().map(Rule::from_value).collect()),
                None => Rule::Malformed("'or' must be a list of rules".to_string()),
            };
        }

        match (obj.get("condition"), obj.get("type")) {
            (Some(condition), Some(Value::String(kind))) => Rule::Predicate(Predicate {
                condition: Condition::from_value(condition),
                kind: kind.clone(),
                extract: obj.get("extract").map(ExtractSpec::from_value),
            }),
            (Some(_), Some(other)) => {
                Rule::Malformed(format!("'type' must be a string, got {}", kind_of(other)))
            }
            (None, _) => Rule::Malformed("rule has neither 'or' nor 'condition'".to_string()),
            (_, None) => Rule::Malformed("predicate is missing 'type'".to_string()),
        }
    }

    /// Collects a description of every malformed clause in this tree
    ///
    /// Malformed extraction specs are included, since they silently extract
    /// nothing.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        self.collect_problems("rule", &mut problems);
        problems
    }

    fn collect_problems(&self, path: &str, out: &mut Vec<String>) {
        match self {
            Rule::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    child.collect_problems(&format!("{}.or[{}]", path, i), out);
                }
            }
            Rule::Predicate(predicate) => {
                predicate
                    .condition
                    .collect_problems(&format!("{}.condition", path), out);
                if let Some(extract) = &predicate.extract {
                    if extract.from_tag.is_empty() {
                        out.push(format!("{}.extract: missing 'from_tag'", path));
                    }
                }
            }
            Rule::Malformed(reason) => out.push(format!("{}: {}", path, reason)),
        }
    }
}

impl Condition {
    /// Builds a condition from its JSON representation
    ///
    /// A bare list is read as an implicit `and`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Condition::And(items.iter().map(Condition::from_value).collect()),
            Value::Object(obj) => {
                if let Some(children) = obj.get("and") {
                    return Condition::group(children, "and", Condition::And);
                }
                if let Some(children) = obj.get("or") {
                    return Condition::group(children, "or", Condition::Or);
                }
                TagPredicate::from_object(obj)
                    .map(Condition::Tag)
                    .unwrap_or_else(Condition::Malformed)
            }
            other => Condition::Malformed(format!(
                "condition must be an object or a list, got {}",
                kind_of(other)
            )),
        }
    }

    fn group(children: &Value, key: &str, build: fn(Vec<Condition>) -> Condition) -> Condition {
        match children.as_array() {
            Some(items) => build(items.iter().map(Condition::from_value).collect()),
            None => Condition::Malformed(format!("'{}' must be a list of conditions", key)),
        }
    }

    fn collect_problems(&self, path: &str, out: &mut Vec<String>) {
        match self {
            Condition::And(children) | Condition::Or(children) => {
                let key = if matches!(self, Condition::And(_)) { "and" } else { "or" };
                for (i, child) in children.iter().enumerate() {
                    child.collect_problems(&format!("{}.{}[{}]", path, key, i), out);
                }
            }
            Condition::Tag(_) => {}
            Condition::Malformed(reason) => out.push(format!("{}: {}", path, reason)),
        }
    }
}

impl TagPredicate {
    fn from_object(obj: &Map<String, Value>) -> Result<Self, String> {
        let tag = match obj.get("tag") {
            Some(Value::String(tag)) if !tag.is_empty() => tag.clone(),
            Some(Value::String(_)) | None => return Err("condition has no 'tag'".to_string()),
            Some(other) => return Err(format!("'tag' must be a string, got {}", kind_of(other))),
        };

        let text = match obj.get("text_contains") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(TextMatch::Contains(s.clone())),
            Some(Value::Bool(b)) => Some(TextMatch::NonEmpty(*b)),
            Some(other) => {
                return Err(format!(
                    "'text_contains' must be a string or a boolean, got {}",
                    kind_of(other)
                ))
            }
        };

        Ok(TagPredicate {
            tag,
            exists: matches!(obj.get("exists"), Some(Value::Bool(true))),
            attribute: optional_string(obj, "attribute")?,
            value: optional_string(obj, "value")?,
            content: optional_string(obj, "content")?,
            text,
        })
    }
}

impl ExtractSpec {
    /// Builds an extraction spec; an unusable shape yields an empty `from_tag`,
    /// which extracts nothing
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return ExtractSpec::default();
        };
        let string = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        ExtractSpec {
            from_tag: string("from_tag").unwrap_or_default(),
            attribute: string("attribute"),
            value: string("value"),
            text_contains: string("text_contains"),
        }
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        // Attribute values are text; a number or boolean can never equal one
        Some(other) => Err(format!("'{}' must be a string, got {}", key, kind_of(other))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
