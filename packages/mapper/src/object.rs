//! Object instances and their lifecycle.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use kvmapper_client::{from_value, to_value, IndexEntry, Link, Map, Record, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Mapper, Model, SaveMode, ValidationError};

/// The value held by one field of an object.
#[derive(Clone, Debug)]
pub enum FieldValue {
    /// A plain value.
    Value(Value),
    /// Related objects; the value of a link field.
    Objects(Vec<Object>),
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

impl From<Vec<Object>> for FieldValue {
    fn from(v: Vec<Object>) -> Self {
        FieldValue::Objects(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Value(v.into())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Value(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Value(v.into())
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Value(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Value(v.into())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Value(v.into())
    }
}

/// Where an object is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectState {
    /// Never stored, nothing pending validation.
    Unsaved,
    /// Fields were assigned since the last clean.
    CleanPending,
    /// Backed by a stored record and clean.
    Saved,
    /// The backing record was removed. Terminal.
    Deleted,
}

/// An instance of a [`Model`]: field values, identity and pending links.
///
/// Fields may be left unset; unset is distinct from null. Nothing is
/// validated until [`Object::clean`] (which [`Object::save`] runs).
///
/// # Example
///
/// ```rust
/// use kvmapper::field::Field;
/// use kvmapper::{Client, Mapper, ModelBuilder, Object, Registry};
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
/// let mut user = Object::new(&person);
/// user.set("first_name", "soren");
/// user.set("age", "32");
/// user.save(&mapper).unwrap();
///
/// let loaded = mapper.get(&person, user.key().unwrap()).unwrap();
/// assert_eq!(loaded.get("age").unwrap().as_i64(), Some(32));
/// ```
#[derive(Clone)]
pub struct Object {
    model: Arc<Model>,
    key: Option<String>,
    requested_key: Option<String>,
    fields: BTreeMap<String, FieldValue>,
    removed: BTreeSet<String>,
    links: Vec<Link>,
    record: Option<Record>,
    dirty: bool,
    deleted: bool,
}

impl Object {
    // === Construction ===

    /// A fresh, unsaved instance with no fields set.
    pub fn new(model: &Arc<Model>) -> Self {
        Self {
            model: Arc::clone(model),
            key: None,
            requested_key: None,
            fields: BTreeMap::new(),
            removed: BTreeSet::new(),
            links: Vec::new(),
            record: None,
            dirty: false,
            deleted: false,
        }
    }

    /// A fresh instance with the given fields assigned.
    ///
    /// Missing required fields are only reported by `clean`/`save`.
    pub fn with_fields<K, V>(model: &Arc<Model>, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut object = Self::new(model);
        object.update(values);
        object
    }

    /// Build an instance from a serializable value (a struct or a map).
    pub fn from_serializable<T: Serialize>(model: &Arc<Model>, data: &T) -> Result<Self, Error> {
        match to_value(data)? {
            Value::Map(map) => Ok(Self::with_fields(model, map)),
            other => Err(kvmapper_client::Error::Encode {
                message: format!("expected a map of fields, found {}", other.type_name()),
            }
            .into()),
        }
    }

    /// Store under `key` on first save instead of a store-assigned key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.requested_key = Some(key.into());
        self
    }

    /// An instance backed by a record retrieved from the store.
    ///
    /// Every payload entry becomes a field value, declared or not; link
    /// fields stay unset until resolved through [`Object::related`].
    pub fn load(model: &Arc<Model>, record: Record) -> Self {
        let mut object = Self::new(model);
        object.fields = record
            .data()
            .iter()
            .map(|(name, value)| (name.clone(), FieldValue::Value(value.clone())))
            .collect();
        object.key = record.key().map(str::to_string);
        object.links = record.links().to_vec();
        object.record = Some(record);
        object
    }

    // === Inspection ===

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// The store key; unset until the first successful save.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Pending links, as they will be written on the next save.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The backing record, if stored.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn state(&self) -> ObjectState {
        if self.deleted {
            ObjectState::Deleted
        } else if self.dirty {
            ObjectState::CleanPending
        } else if self.record.is_some() {
            ObjectState::Saved
        } else {
            ObjectState::Unsaved
        }
    }

    /// Whether a value is assigned to `name` (resolved link fields included).
    pub fn is_set(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The value of a plain field.
    ///
    /// Unset and undeclared fields are `Error::NoSuchField`; link fields are
    /// read with [`Object::related`].
    pub fn get(&self, name: &str) -> Result<&Value, Error> {
        if self.model.schema().is_link_field(name) {
            return Err(Error::LinkField {
                field: name.to_string(),
            });
        }

        match self.fields.get(name) {
            Some(FieldValue::Value(value)) => Ok(value),
            Some(FieldValue::Objects(_)) => Err(Error::Validation(
                ValidationError::UnexpectedObjects {
                    field: name.to_string(),
                    model: self.model.name().to_string(),
                },
            )),
            None => Err(Error::NoSuchField {
                field: name.to_string(),
            }),
        }
    }

    /// Whether `other` is backed by the same stored record.
    pub fn same_record(&self, other: &Object) -> bool {
        self.model.bucket() == other.model.bucket()
            && self.key.is_some()
            && self.key == other.key
    }

    // === Mutation ===

    /// Assign each name/value pair. Nothing is validated.
    pub fn update<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        for (name, value) in values {
            self.set(name, value);
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        self.removed.remove(&name);
        self.fields.insert(name, value.into());
        self.dirty = true;
    }

    /// Assign the related objects of a link field.
    pub fn set_related(&mut self, name: impl Into<String>, objects: Vec<Object>) {
        self.set(name, FieldValue::Objects(objects));
    }

    /// Remove a field's value.
    ///
    /// On a link field this drops every link through it. On a plain field
    /// the removal is also applied to the stored payload on the next save.
    pub fn unset(&mut self, name: &str) {
        if self.model.schema().is_link_field(name) {
            self.set_related(name, Vec::new());
            return;
        }
        self.fields.remove(name);
        self.removed.insert(name.to_string());
        self.dirty = true;
    }

    // === Relationships ===

    /// The objects related through link field `name`.
    ///
    /// An unset link field is resolved from the backing record's links tagged
    /// `name`; each target is fetched and typed through the mapper's registry.
    /// The result is cached on the instance.
    pub fn related(&mut self, mapper: &Mapper, name: &str) -> Result<&[Object], Error> {
        match self.model.schema().get(name) {
            None => {
                return Err(Error::NoSuchField {
                    field: name.to_string(),
                })
            }
            Some(field) if !field.is_link_type() => {
                return Err(Error::NotALinkField {
                    field: name.to_string(),
                })
            }
            Some(_) => {}
        }

        let record = self.record.as_ref();
        let value = match self.fields.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let targets = match record {
                    Some(record) => record
                        .links()
                        .iter()
                        .filter(|link| link.tag == name)
                        .map(|link| mapper.resolve(link))
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                };
                entry.insert(FieldValue::Objects(targets))
            }
        };

        match value {
            FieldValue::Objects(objects) => Ok(objects),
            FieldValue::Value(_) => Err(Error::Validation(ValidationError::NotAnObject {
                field: name.to_string(),
                model: self.model.name().to_string(),
            })),
        }
    }

    // === Lifecycle ===

    /// Validate and normalize every declared field.
    ///
    /// Link fields are turned into pending links tagged with the field name;
    /// plain fields are replaced by their descriptor's cleaned value and then
    /// validated. Running it twice without changes in between is a no-op.
    pub fn clean(&mut self) -> Result<(), ValidationError> {
        let model = Arc::clone(&self.model);

        for (name, field) in model.schema().iter() {
            let has_value = self.fields.contains_key(name)
                || (field.is_link_type() && self.links.iter().any(|link| link.tag == name));
            if field.is_required() && !has_value {
                return Err(ValidationError::Required {
                    field: name.to_string(),
                });
            }

            if field.is_link_type() {
                // Unresolved link fields keep their stored links as they are.
                let Some(value) = self.fields.get(name) else {
                    continue;
                };
                let FieldValue::Objects(targets) = value else {
                    return Err(ValidationError::NotAnObject {
                        field: name.to_string(),
                        model: model.name().to_string(),
                    });
                };

                let mut fresh = Vec::with_capacity(targets.len());
                for target in targets {
                    let key = target.key().ok_or_else(|| ValidationError::UnsavedReference {
                        field: name.to_string(),
                        model: model.name().to_string(),
                    })?;
                    fresh.push(Link::new(target.model().bucket(), key, name));
                }

                self.links.retain(|link| link.tag != name);
                self.links.extend(fresh);
            } else if let Some(value) = self.fields.get_mut(name) {
                let FieldValue::Value(raw) = value else {
                    return Err(ValidationError::UnexpectedObjects {
                        field: name.to_string(),
                        model: model.name().to_string(),
                    });
                };
                let cleaned = field.clean(raw.clone())?;
                field.validate(&cleaned)?;
                *raw = cleaned;
            }
        }

        self.dirty = false;
        Ok(())
    }

    /// Clean and store the object.
    ///
    /// Runs `pre_save`, `clean`, writes payload, links and backref indexes in
    /// one store round trip, adopts the key and runs `post_save`. Links and
    /// indexes are replaced wholesale, never diffed.
    pub fn save(&mut self, mapper: &Mapper) -> Result<(), Error> {
        if self.deleted {
            return Err(self.deleted_error());
        }

        let model = Arc::clone(&self.model);
        model.hooks().pre_save(self)?;
        self.clean()?;

        let bucket = mapper.client().bucket(model.bucket());
        if model.is_searchable() && mapper.config().auto_enable_search {
            bucket.enable_search()?;
        }

        let payload = self.payload(mapper.config().save_mode);
        let mut record = match &self.record {
            Some(record) => {
                let mut record = record.clone();
                record.set_data(payload);
                record
            }
            None => bucket.new_record(self.requested_key.as_deref(), payload),
        };

        record.set_links(self.links.clone());
        let stale: Vec<IndexEntry> = record.indexes().iter().cloned().collect();
        for entry in &stale {
            record.remove_index(&entry.name, &entry.value);
        }
        for entry in self.backref_entries() {
            record.add_index(entry.name, entry.value);
        }

        log::debug!(
            "Saving {} {}...",
            model.name(),
            record.key().unwrap_or("<new>")
        );
        let key = record.store()?.to_string();
        self.key = Some(key);
        self.record = Some(record);
        self.removed.clear();

        model.hooks().post_save(self)
    }

    /// Remove the backing record from the store.
    ///
    /// Without a backing record this does nothing. A failing `pre_delete`
    /// leaves both the record and this instance untouched.
    pub fn delete(&mut self) -> Result<(), Error> {
        let Some(record) = &self.record else {
            return Ok(());
        };
        let mut record = record.clone();

        let model = Arc::clone(&self.model);
        model.hooks().pre_delete(self)?;

        log::debug!("Deleting {} {}...", model.name(), record.key().unwrap_or("?"));
        record.delete()?;
        self.record = None;
        self.deleted = true;
        self.dirty = false;

        model.hooks().post_delete(self)
    }

    // === Views ===

    /// JSON document of the declared fields.
    ///
    /// Link fields render as lists of `"bucket/key"` targets.
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for (name, field) in self.model.schema().iter() {
            if field.is_link_type() {
                let targets: Vec<serde_json::Value> = match self.fields.get(name) {
                    Some(FieldValue::Objects(objects)) => objects
                        .iter()
                        .map(|o| match o.key() {
                            Some(key) => format!("{}/{}", o.model().bucket(), key).into(),
                            None => serde_json::Value::Null,
                        })
                        .collect(),
                    _ => self
                        .links
                        .iter()
                        .filter(|link| link.tag == name)
                        .map(|link| link.target().into())
                        .collect(),
                };
                out.insert(name.to_string(), serde_json::Value::Array(targets));
            } else if let Some(FieldValue::Value(value)) = self.fields.get(name) {
                out.insert(
                    name.to_string(),
                    serde_json::to_value(value).unwrap_or_default(),
                );
            }
        }
        serde_json::Value::Object(out)
    }

    /// Deserialize the declared plain fields into a Rust type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let mut map = Map::new();
        for (name, field) in self.model.schema().iter() {
            if field.is_link_type() {
                continue;
            }
            if let Some(FieldValue::Value(value)) = self.fields.get(name) {
                map.insert(name.to_string(), value.clone());
            }
        }
        Ok(from_value(Value::Map(map))?)
    }

    // === Internals ===

    fn payload(&self, mode: SaveMode) -> Map {
        let mut payload = match (mode, &self.record) {
            (SaveMode::Merge, Some(record)) => {
                let mut stored = record.data().clone();
                for name in &self.removed {
                    stored.remove(name);
                }
                stored
            }
            _ => Map::new(),
        };

        for (name, field) in self.model.schema().iter() {
            if field.is_link_type() {
                continue;
            }
            if let Some(FieldValue::Value(value)) = self.fields.get(name) {
                payload.insert(name.to_string(), value.clone());
            }
        }
        payload
    }

    fn backref_entries(&self) -> Vec<IndexEntry> {
        self.model
            .schema()
            .link_fields()
            .filter(|(_, field)| field.backref())
            .flat_map(|(name, _)| {
                self.links
                    .iter()
                    .filter(move |link| link.tag == name)
                    .map(move |link| IndexEntry::new(IndexEntry::binary_name(name), link.target()))
            })
            .collect()
    }

    fn deleted_error(&self) -> Error {
        Error::Deleted {
            bucket: self.model.bucket().to_string(),
            key: self.key.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("model", &self.model.name())
            .field("key", &self.key)
            .field("fields", &self.fields)
            .field("links", &self.links)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, RelatedObjects};
    use crate::{Criteria, ModelBuilder, Registry};
    use collection_literals::btree;
    use kvmapper_client::Client;
    use kvmapper_memory_store::MemoryBackend;

    fn person() -> Arc<Model> {
        Arc::new(
            ModelBuilder::new("Person", "users")
                .field("first_name", Field::string().required())
                .field("last_name", Field::string())
                .field("age", Field::integer())
                .field("manager", RelatedObjects::with_backref())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn construction_is_unvalidated() {
        let model = person();
        let user = Object::with_fields(&model, [("last_name", "hansen"), ("age", "foobar")]);
        assert_eq!(user.state(), ObjectState::CleanPending);
        assert_eq!(user.key(), None);
        assert_eq!(user.get("age").unwrap(), &Value::from("foobar"));
        assert_eq!(Object::new(&model).state(), ObjectState::Unsaved);
    }

    #[test]
    fn clean_reports_missing_required_field() {
        let model = person();
        let mut user = Object::with_fields(&model, [("last_name", "hansen")]);
        assert_eq!(
            user.clean().unwrap_err(),
            ValidationError::Required {
                field: "first_name".to_string()
            }
        );
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let model = person();
        let mut user = Object::with_fields(&model, [("first_name", "soren")]);
        user.clean().unwrap();
        assert_eq!(user.state(), ObjectState::Unsaved);
    }

    #[test]
    fn clean_coerces_integers() {
        let model = person();
        let mut user = Object::with_fields(
            &model,
            btree! {
                "first_name" => Value::from("soren"),
                "age" => Value::from("32"),
            },
        );
        assert_eq!(user.get("age").unwrap(), &Value::from("32"));
        user.clean().unwrap();
        assert_eq!(user.get("age").unwrap(), &Value::Integer(32));
    }

    #[test]
    fn clean_rejects_bad_integer_without_touching_it() {
        let model = person();
        let mut user = Object::with_fields(&model, [("first_name", "soren"), ("age", "foobar")]);
        assert!(matches!(
            user.clean(),
            Err(ValidationError::Coercion { target: "integer", .. })
        ));
        assert_eq!(user.get("age").unwrap(), &Value::from("foobar"));
    }

    #[test]
    fn link_field_requires_objects() {
        let model = person();
        let mut user = Object::with_fields(&model, [("first_name", "john"), ("manager", "jane")]);
        assert!(matches!(
            user.clean(),
            Err(ValidationError::NotAnObject { .. })
        ));
    }

    #[test]
    fn link_targets_must_be_saved() {
        let model = person();
        let jane = Object::with_fields(&model, [("first_name", "jane")]);
        let mut john = Object::with_fields(&model, [("first_name", "john")]);
        john.set_related("manager", vec![jane]);
        assert!(matches!(
            john.clean(),
            Err(ValidationError::UnsavedReference { .. })
        ));
    }

    #[test]
    fn objects_on_plain_field_rejected() {
        let model = person();
        let mut user = Object::with_fields(&model, [("first_name", "john")]);
        user.set_related("last_name", vec![]);
        assert!(matches!(
            user.clean(),
            Err(ValidationError::UnexpectedObjects { .. })
        ));
    }

    #[test]
    fn get_distinguishes_link_and_unknown_fields() {
        let model = person();
        let user = Object::with_fields(&model, [("first_name", "john")]);
        assert!(matches!(user.get("manager"), Err(Error::LinkField { .. })));
        assert!(matches!(user.get("age"), Err(Error::NoSuchField { .. })));
        assert!(matches!(user.get("shoe_size"), Err(Error::NoSuchField { .. })));
    }

    #[test]
    fn undeclared_fields_are_kept_but_not_persisted() {
        let model = person();
        let user = Object::with_fields(&model, [("first_name", "john"), ("nickname", "jj")]);
        assert_eq!(user.get("nickname").unwrap(), &Value::from("jj"));

        let payload = user.payload(SaveMode::Replace);
        assert!(payload.contains_key("first_name"));
        assert!(!payload.contains_key("nickname"));
    }

    #[test]
    fn unset_link_field_clears_links() {
        let model = person();
        let mut user = Object::with_fields(&model, [("first_name", "john")]);
        user.links.push(Link::new("users", "jane", "manager"));
        user.unset("manager");
        user.clean().unwrap();
        assert!(user.links().is_empty());
    }

    #[test]
    fn to_json_lists_declared_fields() {
        let model = person();
        let mut user = Object::with_fields(&model, [("first_name", "john"), ("age", "40")]);
        user.links.push(Link::new("users", "jane", "manager"));
        user.clean().unwrap();

        assert_eq!(
            user.to_json(),
            serde_json::json!({
                "first_name": "john",
                "age": 40,
                "manager": ["users/jane"],
            })
        );
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct PersonView {
        first_name: String,
        age: Option<i64>,
    }

    #[test]
    fn serde_views() {
        let model = person();
        let view = PersonView {
            first_name: "soren".to_string(),
            age: Some(32),
        };
        let user = Object::from_serializable(&model, &view).unwrap();
        assert_eq!(user.get("first_name").unwrap(), &Value::from("soren"));
        assert_eq!(user.deserialize::<PersonView>().unwrap(), view);

        assert!(Object::from_serializable(&model, &"just a string").is_err());
    }

    #[test]
    fn backref_entries_follow_links() {
        let model = person();
        let mut user = Object::with_fields(&model, [("first_name", "john")]);
        user.links.push(Link::new("users", "jane", "manager"));
        user.links.push(Link::new("users", "bob", "mentor"));

        assert_eq!(
            user.backref_entries(),
            vec![IndexEntry::new("manager_bin", "users/jane")]
        );
    }

    fn session() -> (Mapper, Arc<Model>) {
        let mut registry = Registry::new();
        let model = registry
            .register(
                ModelBuilder::new("Person", "users")
                    .field("first_name", Field::string().required())
                    .field("age", Field::integer())
                    .field("manager", RelatedObjects::with_backref())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        (Mapper::new(Client::new(MemoryBackend::new()), registry), model)
    }

    #[test]
    fn clean_twice_changes_nothing() {
        let (mapper, model) = session();
        let mut jane = Object::with_fields(&model, [("first_name", "jane")]);
        jane.save(&mapper).unwrap();

        let mut john = Object::with_fields(&model, [("first_name", "john"), ("age", "32")]);
        john.set_related("manager", vec![jane.clone()]);

        john.clean().unwrap();
        let links = john.links().to_vec();
        let json = john.to_json();
        john.clean().unwrap();

        assert_eq!(john.links(), links.as_slice());
        assert_eq!(john.links().len(), 1);
        assert_eq!(john.to_json(), json);
        assert_eq!(john.get("age").unwrap(), &Value::Integer(32));
        assert_eq!(john.state(), ObjectState::Unsaved);
    }

    #[test]
    fn clean_twice_after_resolving_links() {
        let (mapper, model) = session();
        let mut jane = Object::with_fields(&model, [("first_name", "jane")]);
        jane.save(&mapper).unwrap();
        let mut john = Object::with_fields(&model, [("first_name", "john")]);
        john.set_related("manager", vec![jane.clone()]);
        john.save(&mapper).unwrap();

        let mut loaded = mapper.get(&model, john.key().unwrap()).unwrap();
        assert_eq!(loaded.related(&mapper, "manager").unwrap().len(), 1);
        loaded.clean().unwrap();
        loaded.clean().unwrap();
        assert_eq!(
            loaded.links(),
            &[Link::new("users", jane.key().unwrap(), "manager")]
        );

        loaded.save(&mapper).unwrap();
        let reports = mapper
            .query(&model, Criteria::new().linked("manager", &jane))
            .unwrap()
            .all()
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].same_record(&john));
    }
}
