//! Typed filter predicates for map/reduce style scans.
//!
//! A `Predicate` is built in-process and either evaluated directly against a
//! decoded payload (in-process backends) or rendered into the store's own
//! map-phase language. Field names and values are always rendered as JSON
//! literals, never spliced into code as raw text.

use std::fmt;

use crate::{Map, Value};

/// A filter over record payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// The record carries a decodable payload.
    HasData,
    /// The payload's `field` equals `value`.
    FieldEquals { field: String, value: Value },
    /// Every inner predicate holds. An empty conjunction always holds.
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction of `self` and `other`, flattening nested `All`s.
    pub fn and(self, other: Predicate) -> Self {
        let mut terms = match self {
            Predicate::All(terms) => terms,
            single => vec![single],
        };
        match other {
            Predicate::All(more) => terms.extend(more),
            single => terms.push(single),
        }
        Predicate::All(terms)
    }

    /// Evaluate against a decoded payload.
    ///
    /// Integers and floats compare numerically; a missing field only equals
    /// `Value::Null`.
    pub fn matches(&self, payload: &Map) -> bool {
        match self {
            Predicate::HasData => true,
            Predicate::FieldEquals { field, value } => match payload.get(field) {
                Some(stored) => values_equal(stored, value),
                None => value.is_null(),
            },
            Predicate::All(terms) => terms.iter().all(|t| t.matches(payload)),
        }
    }

    /// Render as a JavaScript map function returning `[v.key]` on a match.
    pub fn to_javascript(&self) -> String {
        format!(
            concat!(
                "function(v) {{\n",
                "    var json_string = v.values[0].data;\n",
                "    if (json_string == '') return [];\n",
                "    var data = JSON.parse(json_string);\n",
                "    if ({}) {{\n",
                "        return [v.key];\n",
                "    }}\n",
                "    return [];\n",
                "}}"
            ),
            self.condition()
        )
    }

    fn condition(&self) -> String {
        match self {
            Predicate::HasData => "data".to_string(),
            Predicate::FieldEquals { field, value } => {
                let accessor = format!("data[{}]", json_literal(&Value::from(field.as_str())));
                match value {
                    Value::Null => format!("{} == null", accessor),
                    Value::Array(_) | Value::Map(_) => format!(
                        "JSON.stringify({}) === {}",
                        accessor,
                        json_literal(&Value::String(json_literal(value)))
                    ),
                    scalar => format!("{} === {}", accessor, json_literal(scalar)),
                }
            }
            Predicate::All(terms) if terms.is_empty() => "true".to_string(),
            Predicate::All(terms) => terms
                .iter()
                .map(|t| format!("({})", t.condition()))
                .collect::<Vec<_>>()
                .join(" && "),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.condition())
    }
}

fn json_literal(value: &Value) -> String {
    value.to_string()
}

fn values_equal(stored: &Value, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            (*a as f64) == *b
        }
        (a, b) => a == b,
    }
}
