//! Field descriptors.
//!
//! A field descriptor is the declarative unit of a schema: it knows how to
//! normalize (`clean`) and check (`validate`) a raw value, and whether the
//! field is a link field. The rest of the engine looks at nothing but
//! `is_link_type` and `backref`, so a new scalar kind only has to implement
//! [`FieldKind::clean`] and [`FieldKind::validate`].
//!
//! # Example
//!
//! ```rust
//! use kvmapper::field::{FieldKind, Field};
//! use kvmapper::{ValidationError, Value};
//!
//! #[derive(Debug)]
//! struct Lowercase;
//!
//! impl FieldKind for Lowercase {
//!     fn type_name(&self) -> &'static str {
//!         "lowercase"
//!     }
//!
//!     fn clean(&self, value: Value) -> Result<Value, ValidationError> {
//!         match value {
//!             Value::String(s) => Ok(Value::String(s.to_lowercase())),
//!             other => Ok(other),
//!         }
//!     }
//! }
//!
//! let field = Field::new(Lowercase).required();
//! assert_eq!(field.clean(Value::from("JANE")).unwrap(), Value::from("jane"));
//! ```

use std::fmt;

use kvmapper_client::Value;

use crate::ValidationError;

/// Behaviour of one kind of field.
pub trait FieldKind: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Normalize a raw value.
    fn clean(&self, value: Value) -> Result<Value, ValidationError> {
        Ok(value)
    }

    /// Check an already cleaned value.
    fn validate(&self, _value: &Value) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Link fields hold related objects and are persisted as links.
    fn is_link_type(&self) -> bool {
        false
    }

    /// Link fields only: also maintain a secondary index for reverse lookups.
    fn backref(&self) -> bool {
        false
    }
}

/// A named field's descriptor: its kind plus the `required` flag.
#[derive(Debug)]
pub struct Field {
    kind: Box<dyn FieldKind>,
    required: bool,
}

impl Field {
    pub fn new(kind: impl FieldKind + 'static) -> Self {
        Self {
            kind: Box::new(kind),
            required: false,
        }
    }

    /// Any structured value, stored as given.
    pub fn opaque() -> Self {
        Self::new(Opaque)
    }

    pub fn string() -> Self {
        Self::new(Text)
    }

    pub fn integer() -> Self {
        Self::new(Integer)
    }

    /// Links to other objects, without a reverse-lookup index.
    pub fn related_objects() -> Self {
        Self::new(RelatedObjects::new())
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_link_type(&self) -> bool {
        self.kind.is_link_type()
    }

    pub fn backref(&self) -> bool {
        self.kind.is_link_type() && self.kind.backref()
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn clean(&self, value: Value) -> Result<Value, ValidationError> {
        self.kind.clean(value)
    }

    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.kind.validate(value)
    }
}

impl<K: FieldKind + 'static> From<K> for Field {
    fn from(kind: K) -> Self {
        Field::new(kind)
    }
}

/// Opaque structured value; no transformation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Opaque;

impl FieldKind for Opaque {
    fn type_name(&self) -> &'static str {
        "opaque"
    }
}

/// A string-like scalar, stored as given.
///
/// Other scalars (numbers, bools, null) pass, so records written by other
/// clients keep saving. Arrays and maps are rejected: structured values
/// belong in an [`Opaque`] field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl FieldKind for Text {
    fn type_name(&self) -> &'static str {
        "string"
    }

    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Array(_) | Value::Map(_) => Err(ValidationError::Type {
                expected: "string",
                found: value.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// A signed 64-bit integer.
///
/// `clean` parses decimal text (surrounding whitespace ignored) and accepts
/// floats without a fractional part. Null passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl FieldKind for Integer {
    fn type_name(&self) -> &'static str {
        "integer"
    }

    fn clean(&self, value: Value) -> Result<Value, ValidationError> {
        if matches!(value, Value::Integer(_) | Value::Null) {
            return Ok(value);
        }

        let coerced = match &value {
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            _ => None,
        };

        coerced.map(Value::Integer).ok_or(ValidationError::Coercion {
            value,
            target: "integer",
        })
    }

    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Integer(_) | Value::Null => Ok(()),
            other => Err(ValidationError::Type {
                expected: "integer",
                found: other.clone(),
            }),
        }
    }
}

/// Links to other registered objects, tagged with the field name.
///
/// Coercion and validation of the related objects happen on the object, not
/// here: `clean` is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedObjects {
    backref: bool,
}

impl RelatedObjects {
    pub fn new() -> Self {
        Self { backref: false }
    }

    /// Also index each link as `<field>_bin = <bucket>/<key>`, so "which
    /// objects link here through this field" is an index lookup.
    pub fn with_backref() -> Self {
        Self { backref: true }
    }
}

impl FieldKind for RelatedObjects {
    fn type_name(&self) -> &'static str {
        "related objects"
    }

    fn is_link_type(&self) -> bool {
        true
    }

    fn backref(&self) -> bool {
        self.backref
    }
}
