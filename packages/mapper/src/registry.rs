//! The schema registry: which object type owns which bucket.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{Model, ObjectType};
use crate::DefinitionError;

/// Maps bucket names to the object types stored in them.
///
/// Needed to turn link targets back into typed objects. A registry is an
/// ordinary value: build one per process (or per test), define every type
/// while holding it mutably, then hand it to a [`crate::Mapper`], which only
/// reads it.
#[derive(Debug, Default)]
pub struct Registry {
    models: BTreeMap<String, Arc<Model>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built model under its bucket.
    ///
    /// At most one type per bucket: a second registration for the same
    /// bucket is rejected.
    pub fn register(&mut self, model: Model) -> Result<Arc<Model>, DefinitionError> {
        if let Some(existing) = self.models.get(model.bucket()) {
            return Err(DefinitionError::DuplicateBucket {
                bucket: model.bucket().to_string(),
                existing: existing.name().to_string(),
            });
        }

        log::debug!("Registering {} in bucket {}", model.name(), model.bucket());
        let model = Arc::new(model);
        self.models
            .insert(model.bucket().to_string(), Arc::clone(&model));
        Ok(model)
    }

    /// Build and register the model declared by `T`.
    pub fn define<T: ObjectType>(&mut self) -> Result<Arc<Model>, DefinitionError> {
        self.register(T::model()?)
    }

    pub fn by_bucket(&self, bucket: &str) -> Option<&Arc<Model>> {
        self.models.get(bucket)
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<Model>> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
