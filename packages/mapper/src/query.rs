//! Lazy queries over one object type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use kvmapper_client::{IndexEntry, Link, Predicate, SearchQuery, Value};

use crate::{Error, Mapper, Model, Object, ValidationError};

/// What a single criterion asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Criterion {
    /// The field equals this value.
    Value(Value),
    /// The link field points at this object.
    Object { bucket: String, key: Option<String> },
}

/// Field name to criterion, ANDed together.
///
/// ```rust
/// use kvmapper::Criteria;
///
/// let criteria = Criteria::new().eq("last_name", "hansen").eq("age", 32);
/// assert_eq!(criteria.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    criteria: BTreeMap<String, Criterion>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.criteria
            .insert(field.into(), Criterion::Value(value.into()));
        self
    }

    /// Match objects whose link field `field` points at `target`.
    pub fn linked(mut self, field: impl Into<String>, target: &Object) -> Self {
        self.criteria.insert(
            field.into(),
            Criterion::Object {
                bucket: target.model().bucket().to_string(),
                key: target.key().map(str::to_string),
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.criteria.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Criteria::new(), |criteria, (k, v)| criteria.eq(k, v))
    }
}

/// How a query is answered by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    /// Secondary index lookup on a backref.
    Index,
    /// Full-text search on a searchable bucket.
    Search,
    /// Map/reduce scan over the whole bucket.
    Scan,
}

#[derive(Clone, Debug)]
enum Strategy {
    Index(IndexEntry),
    Search(SearchQuery),
    Scan(Predicate),
}

/// A planned query. Nothing touches the store until [`Query::all`].
///
/// # Example
///
/// ```rust
/// use kvmapper::field::Field;
/// use kvmapper::{Client, Criteria, Mapper, ModelBuilder, Object, QueryKind, Registry};
/// use kvmapper_memory_store::MemoryBackend;
///
/// let mut registry = Registry::new();
/// let person = registry
///     .register(
///         ModelBuilder::new("Person", "users")
///             .field("first_name", Field::string())
///             .field("age", Field::integer())
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
/// let mapper = Mapper::new(Client::new(MemoryBackend::new()), registry);
///
/// for (name, age) in [("soren", 32), ("jane", 40)] {
///     let mut user = Object::with_fields(&person, [("first_name", name)]);
///     user.set("age", age);
///     user.save(&mapper).unwrap();
/// }
///
/// let query = mapper.query(&person, Criteria::new().eq("age", "40")).unwrap();
/// assert_eq!(query.kind(), QueryKind::Scan);
/// let found = query.all().unwrap();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].get("first_name").unwrap().as_str(), Some("jane"));
/// ```
#[derive(Clone)]
pub struct Query<'m> {
    mapper: &'m Mapper,
    model: Arc<Model>,
    strategy: Strategy,
}

impl<'m> Query<'m> {
    /// Validate `criteria` against the model's schema and pick a strategy.
    pub(crate) fn plan(
        mapper: &'m Mapper,
        model: &Arc<Model>,
        criteria: Criteria,
    ) -> Result<Self, Error> {
        let schema = model.schema();
        let mut plain = Vec::with_capacity(criteria.len());
        let mut linked = Vec::new();

        for (name, criterion) in criteria.criteria {
            let field = schema.get(&name).ok_or_else(|| Error::NoSuchField {
                field: name.clone(),
            })?;

            match (field.is_link_type(), criterion) {
                (true, Criterion::Object { bucket, key }) => {
                    let key = key.ok_or_else(|| ValidationError::UnsavedReference {
                        field: name.clone(),
                        model: model.name().to_string(),
                    })?;
                    linked.push((name, field.backref(), Link::new(bucket, key, "")));
                }
                (true, Criterion::Value(_)) => {
                    return Err(invalid(format!("{} is a link field, match it against an object", name)))
                }
                (false, Criterion::Object { .. }) => {
                    return Err(invalid(format!("{} is not a link field", name)))
                }
                (false, Criterion::Value(value)) => {
                    plain.push((name, field.clean(value)?));
                }
            }
        }

        let strategy = match (linked.pop(), plain.is_empty() && linked.is_empty()) {
            (Some((name, true, link)), true) => {
                Strategy::Index(IndexEntry::new(IndexEntry::binary_name(&name), link.target()))
            }
            (Some((name, false, _)), true) => {
                return Err(invalid(format!("{} is not indexed as a backref", name)))
            }
            (Some(_), false) => {
                return Err(invalid(
                    "link criteria cannot be combined with other criteria".to_string(),
                ))
            }
            (None, _) if model.is_searchable() && !plain.is_empty() => {
                Strategy::Search(
                    plain
                        .iter()
                        .fold(SearchQuery::new(), |q, (name, value)| q.term(name, value)),
                )
            }
            (None, _) => Strategy::Scan(
                plain
                    .into_iter()
                    .fold(Predicate::HasData, |p, (name, value)| {
                        p.and(Predicate::field_equals(name, value))
                    }),
            ),
        };

        Ok(Self {
            mapper,
            model: Arc::clone(model),
            strategy,
        })
    }

    pub fn kind(&self) -> QueryKind {
        match self.strategy {
            Strategy::Index(_) => QueryKind::Index,
            Strategy::Search(_) => QueryKind::Search,
            Strategy::Scan(_) => QueryKind::Scan,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// The query text sent to the store.
    pub fn describe(&self) -> String {
        match &self.strategy {
            Strategy::Index(entry) => format!("{}={}", entry.name, entry.value),
            Strategy::Search(query) => query.to_query_string(),
            Strategy::Scan(predicate) => predicate.to_javascript(),
        }
    }

    /// Run the query and load every match.
    ///
    /// Keys whose records disappeared before they could be fetched are
    /// skipped. Order is unspecified.
    pub fn all(&self) -> Result<Vec<Object>, Error> {
        let client = self.mapper.client();
        let bucket = self.model.bucket();

        let keys = match &self.strategy {
            Strategy::Index(entry) => client.index(bucket, &entry.name, &entry.value)?,
            Strategy::Search(query) => {
                return Ok(client
                    .search(bucket, query)?
                    .into_iter()
                    .map(|record| Object::load(&self.model, record))
                    .collect());
            }
            Strategy::Scan(predicate) => client
                .map_reduce(bucket)
                .filter(predicate.clone())
                .run()?,
        };

        let handle = client.bucket(bucket);
        let mut objects = Vec::with_capacity(keys.len());
        for key in keys {
            let record = handle.get(&key)?;
            if !record.exists() {
                log::debug!("Skipping {}/{}, gone before it was fetched", bucket, key);
                continue;
            }
            objects.push(Object::load(&self.model, record));
        }
        Ok(objects)
    }
}

impl fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("model", &self.model.name())
            .field("kind", &self.kind())
            .field("query", &self.describe())
            .finish()
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidQuery { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, RelatedObjects};
    use crate::{ModelBuilder, Registry};
    use kvmapper_client::Client;
    use kvmapper_memory_store::MemoryBackend;

    fn fixture(searchable: bool) -> (Mapper, Arc<Model>) {
        let mut builder = ModelBuilder::new("Person", "users")
            .field("first_name", Field::string())
            .field("age", Field::integer())
            .field("manager", RelatedObjects::with_backref())
            .field("friends", RelatedObjects::new());
        if searchable {
            builder = builder.searchable();
        }
        let mut registry = Registry::new();
        let model = registry.register(builder.build().unwrap()).unwrap();
        (Mapper::new(Client::new(MemoryBackend::new()), registry), model)
    }

    fn saved(model: &Arc<Model>, key: &str) -> Object {
        let mut object = Object::new(model).with_key(key);
        object.set("first_name", key);
        object
    }

    #[test]
    fn plain_criteria_scan() {
        let (mapper, model) = fixture(false);
        let query = mapper
            .query(&model, Criteria::new().eq("first_name", "soren"))
            .unwrap();
        assert_eq!(query.kind(), QueryKind::Scan);
        assert!(query.describe().contains("\"first_name\""));
    }

    #[test]
    fn empty_criteria_scan_even_when_searchable() {
        let (mapper, model) = fixture(true);
        let query = mapper.query(&model, Criteria::new()).unwrap();
        assert_eq!(query.kind(), QueryKind::Scan);
    }

    #[test]
    fn searchable_models_use_search() {
        let (mapper, model) = fixture(true);
        let query = mapper
            .query(&model, Criteria::new().eq("first_name", "soren"))
            .unwrap();
        assert_eq!(query.kind(), QueryKind::Search);
        assert_eq!(query.describe(), "first_name:\"soren\"");
    }

    #[test]
    fn criteria_are_cleaned() {
        let (mapper, model) = fixture(true);
        let query = mapper.query(&model, Criteria::new().eq("age", "31")).unwrap();
        assert_eq!(query.describe(), "age:\"31\"");

        let err = mapper
            .query(&model, Criteria::new().eq("age", "old"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn backref_criterion_uses_index() {
        let (mapper, model) = fixture(false);
        let mut jane = saved(&model, "jane");
        jane.save(&mapper).unwrap();

        let query = mapper
            .query(&model, Criteria::new().linked("manager", &jane))
            .unwrap();
        assert_eq!(query.kind(), QueryKind::Index);
        assert_eq!(query.describe(), "manager_bin=users/jane");
    }

    #[test]
    fn invalid_criteria() {
        let (mapper, model) = fixture(false);
        let mut jane = saved(&model, "jane");
        jane.save(&mapper).unwrap();

        let cases = [
            Criteria::new().linked("friends", &jane),
            Criteria::new().linked("manager", &jane).eq("first_name", "x"),
            Criteria::new().eq("manager", "jane"),
            Criteria::new().linked("first_name", &jane),
        ];
        for criteria in cases {
            let err = mapper.query(&model, criteria).unwrap_err();
            assert!(matches!(err, Error::InvalidQuery { .. }), "{:?}", err);
        }
    }

    #[test]
    fn unknown_field() {
        let (mapper, model) = fixture(false);
        let err = mapper
            .query(&model, Criteria::new().eq("shoe_size", 44))
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchField { .. }));
    }

    #[test]
    fn unsaved_target() {
        let (mapper, model) = fixture(false);
        let jane = Object::new(&model);
        let err = mapper
            .query(&model, Criteria::new().linked("manager", &jane))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn criteria_from_pairs() {
        let criteria: Criteria = [("first_name", "soren"), ("last_name", "hansen")]
            .into_iter()
            .collect();
        let names: Vec<_> = criteria.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["first_name", "last_name"]);
    }
}
