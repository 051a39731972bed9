//! Object mapping for schemaless key/value stores.
//!
//! Object types declare typed fields; instances are validated and
//! normalized on save and stored as JSON payloads in the type's bucket.
//! Relationships between objects are stored as tagged links, optionally
//! mirrored into a `<field>_bin` secondary index so that "who points at X"
//! can be answered without a scan.
//!
//! - [`field`]: field descriptors (`Text`, `Integer`, `RelatedObjects`, ...)
//! - [`ModelBuilder`] / [`ObjectType`]: declare an object type
//! - [`Registry`]: bucket name to object type
//! - [`Object`]: an instance and its save/delete lifecycle
//! - [`Hooks`]: pre/post save and delete extension points
//! - [`Mapper`]: the session everything goes through
//! - [`Query`]: index, search or scan lookups
//!
//! # Example
//!
//! ```rust
//! use kvmapper::field::{Field, RelatedObjects};
//! use kvmapper::{Client, Criteria, Mapper, ModelBuilder, Object, QueryKind, Registry};
//! use kvmapper_memory_store::MemoryBackend;
//!
//! let mut registry = Registry::new();
//! let person = registry
//!     .register(
//!         ModelBuilder::new("Person", "users")
//!             .field("first_name", Field::string().required())
//!             .field("manager", RelatedObjects::with_backref())
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//! let mapper = Mapper::new(Client::new(MemoryBackend::new()), registry);
//!
//! let mut jane = Object::with_fields(&person, [("first_name", "jane")]);
//! jane.save(&mapper).unwrap();
//!
//! let mut john = Object::with_fields(&person, [("first_name", "john")]);
//! john.set_related("manager", vec![jane.clone()]);
//! john.save(&mapper).unwrap();
//!
//! let reports = mapper
//!     .query(&person, Criteria::new().linked("manager", &jane))
//!     .unwrap();
//! assert_eq!(reports.kind(), QueryKind::Index);
//! assert!(reports.all().unwrap()[0].same_record(&john));
//! ```

pub mod field;

mod config;
mod error;
mod hooks;
mod mapper;
mod model;
mod object;
mod query;
mod registry;
mod schema;

pub use config::{MapperConfig, SaveMode};
pub use error::{DefinitionError, Error, ValidationError};
pub use hooks::{Hooks, NoHooks};
pub use mapper::Mapper;
pub use model::{Model, ModelBuilder, ObjectType};
pub use object::{FieldValue, Object, ObjectState};
pub use query::{Criteria, Criterion, Query, QueryKind};
pub use registry::Registry;
pub use schema::Schema;

pub use kvmapper_client::{Client, Link, Map, Value};
