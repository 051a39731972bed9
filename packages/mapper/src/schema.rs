//! Immutable per-type schemas.

use crate::field::Field;
use crate::DefinitionError;

/// The named field descriptors of one object type, in declaration order.
///
/// Built once when the type is defined and never changed afterwards.
#[derive(Debug)]
pub struct Schema {
    fields: Vec<(String, Field)>,
}

impl Schema {
    pub(crate) fn new(model: &str, fields: Vec<(String, Field)>) -> Result<Self, DefinitionError> {
        for (i, (name, _)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(earlier, _)| earlier == name) {
                return Err(DefinitionError::DuplicateField {
                    model: model.to_string(),
                    field: name.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, field)| field)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `name` is a declared link field.
    pub fn is_link_field(&self, name: &str) -> bool {
        self.get(name).is_some_and(Field::is_link_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn link_fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.iter().filter(|(_, field)| field.is_link_type())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
