//! Storage-client contract for kvmapper.
//!
//! This layer is the narrow interface the object mapper consumes from a
//! schemaless key/value store:
//! - `Value` / `Map`: record payloads
//! - `Link`: tagged edges between records
//! - `IndexEntry`: secondary index entries
//! - `SearchQuery`: full-text search terms
//! - `Predicate`: typed filters for map/reduce scans
//! - `Backend`: the storage primitives a concrete store implements
//! - `Client` / `Bucket` / `Record`: handles the mapper works with
//!
//! Concrete transports (HTTP, protocol buffers) live outside this crate;
//! `kvmapper-memory-store` provides an in-process backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use kvmapper_client::{Client, Predicate};
//!
//! fn adults(client: &Client) -> Result<Vec<String>, kvmapper_client::Error> {
//!     client
//!         .map_reduce("users")
//!         .filter(Predicate::HasData)
//!         .filter(Predicate::field_equals("adult", true))
//!         .run()
//! }
//! ```

pub use bytes::Bytes;

mod backend;
mod client;
mod codec;
mod convert;
mod error;
mod link;
mod predicate;
mod record;
mod search;
mod value;

pub use backend::{Backend, ObjectContent, StoredObject};
pub use client::{Bucket, Client, MapReduce};
pub use codec::JsonCodec;
pub use convert::{from_value, to_value};
pub use error::Error;
pub use link::{IndexEntry, Link};
pub use predicate::Predicate;
pub use record::Record;
pub use search::SearchQuery;
pub use value::{Map, Value};
