//! Object types: schema, bucket and hooks, fixed at definition time.

use std::fmt;
use std::sync::Arc;

use crate::field::Field;
use crate::hooks::{Hooks, NoHooks};
use crate::schema::Schema;
use crate::DefinitionError;

/// A defined object type.
///
/// Holds the immutable [`Schema`] separately from any instance state.
/// Objects keep an `Arc<Model>` to know their schema, bucket and hooks.
pub struct Model {
    name: String,
    bucket: String,
    searchable: bool,
    schema: Schema,
    hooks: Arc<dyn Hooks>,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Searchable types are queried through the search index instead of
    /// scans.
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn hooks(&self) -> &dyn Hooks {
        self.hooks.as_ref()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("bucket", &self.bucket)
            .field("searchable", &self.searchable)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Collects the declaration of an object type.
///
/// # Example
///
/// ```rust
/// use kvmapper::field::{Field, RelatedObjects};
/// use kvmapper::{ModelBuilder, Registry};
///
/// let mut registry = Registry::new();
/// let person = registry
///     .register(
///         ModelBuilder::new("Person", "users")
///             .field("first_name", Field::string().required())
///             .field("last_name", Field::string())
///             .field("manager", RelatedObjects::with_backref())
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
///
/// assert_eq!(person.bucket(), "users");
/// assert!(person.schema().is_link_field("manager"));
/// ```
pub struct ModelBuilder {
    name: String,
    bucket: String,
    searchable: bool,
    fields: Vec<(String, Field)>,
    hooks: Arc<dyn Hooks>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket: bucket.into(),
            searchable: false,
            fields: Vec::new(),
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.fields.push((name.into(), field.into()));
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn hooks(mut self, hooks: impl Hooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Freeze the declaration into a `Model`.
    pub fn build(self) -> Result<Model, DefinitionError> {
        if self.bucket.is_empty() {
            return Err(DefinitionError::EmptyBucket { model: self.name });
        }

        let schema = Schema::new(&self.name, self.fields)?;
        Ok(Model {
            name: self.name,
            bucket: self.bucket,
            searchable: self.searchable,
            schema,
            hooks: self.hooks,
        })
    }
}

/// A Rust type that declares an object type.
///
/// The implementing type doubles as the type's hooks; `Registry::define`
/// builds the schema from [`ObjectType::declare`] once and registers it.
///
/// ```rust
/// use kvmapper::field::Field;
/// use kvmapper::{Hooks, ModelBuilder, ObjectType, Registry};
///
/// #[derive(Default)]
/// struct Person;
///
/// impl Hooks for Person {}
///
/// impl ObjectType for Person {
///     const NAME: &'static str = "Person";
///     const BUCKET: &'static str = "users";
///
///     fn declare(builder: ModelBuilder) -> ModelBuilder {
///         builder
///             .field("first_name", Field::string().required())
///             .field("age", Field::integer())
///     }
/// }
///
/// let mut registry = Registry::new();
/// let model = registry.define::<Person>().unwrap();
/// assert_eq!(model.schema().len(), 2);
/// ```
pub trait ObjectType: Hooks + Default + 'static {
    const NAME: &'static str;
    const BUCKET: &'static str;
    const SEARCHABLE: bool = false;

    fn declare(builder: ModelBuilder) -> ModelBuilder;

    fn model() -> Result<Model, DefinitionError> {
        let mut builder = ModelBuilder::new(Self::NAME, Self::BUCKET).hooks(Self::default());
        if Self::SEARCHABLE {
            builder = builder.searchable();
        }
        Self::declare(builder).build()
    }
}
