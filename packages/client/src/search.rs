//! Full-text search queries.

use std::fmt;

use crate::{Map, Value};

/// A conjunction of `field:"value"` terms against a bucket's search index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
    terms: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term. Values are matched on their text rendering.
    pub fn term(mut self, field: impl Into<String>, value: &Value) -> Self {
        self.terms.push((field.into(), value.to_text()));
        self
    }

    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render in the store's query syntax: `a:"x" AND b:"y"`.
    pub fn to_query_string(&self) -> String {
        self.terms
            .iter()
            .map(|(field, value)| format!("{}:\"{}\"", field, escape_phrase(value)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Phrase match of every term against a payload.
    ///
    /// A term matches when the field's text, split on whitespace and compared
    /// case-insensitively, contains the term's words as a contiguous run.
    pub fn matches(&self, payload: &Map) -> bool {
        self.terms.iter().all(|(field, phrase)| match payload.get(field) {
            Some(value) => contains_phrase(&value.to_text(), phrase),
            None => false,
        })
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_string())
    }
}

fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn contains_phrase(text: &str, phrase: &str) -> bool {
    let haystack = tokens(text);
    let needle = tokens(phrase);
    if needle.is_empty() {
        return haystack.is_empty();
    }
    haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}
