//! The Backend trait: storage primitives a store must offer.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{Error, IndexEntry, Link, Map, Predicate, SearchQuery};

/// A record as held by the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub data: Map,
    pub links: Vec<Link>,
    pub indexes: BTreeSet<IndexEntry>,
}

/// What gets written by a `put`.
#[derive(Clone, Copy, Debug)]
pub struct ObjectContent<'a> {
    pub data: &'a Map,
    pub links: &'a [Link],
    pub indexes: &'a BTreeSet<IndexEntry>,
}

/// Storage primitives, one network round trip each.
///
/// Every call is blocking. Timeouts, retries and connection management are
/// the implementation's business; the mapper surfaces failures as-is.
///
/// # Object Safety
///
/// This trait is object-safe: `Client` holds an `Arc<dyn Backend>`.
pub trait Backend: Send + Sync {
    /// Fetch a record. `Ok(None)` when the key does not exist.
    fn fetch(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Error>;

    /// Write a record, replacing its payload, links and indexes.
    ///
    /// When `key` is `None` the store assigns one. Returns the record's key.
    fn put(&self, bucket: &str, key: Option<&str>, content: ObjectContent<'_>)
        -> Result<String, Error>;

    /// Remove a record. Removing a missing key is not an error.
    fn remove(&self, bucket: &str, key: &str) -> Result<(), Error>;

    /// Keys of records carrying the index entry `index = value`.
    fn index(&self, bucket: &str, index: &str, value: &str) -> Result<Vec<String>, Error>;

    /// Full records matching a search query.
    fn search(&self, bucket: &str, query: &SearchQuery) -> Result<Vec<StoredObject>, Error>;

    /// Keys of records whose payload satisfies `predicate`.
    fn map_reduce(&self, bucket: &str, predicate: &Predicate) -> Result<Vec<String>, Error>;

    /// Turn on search indexing for a bucket. Idempotent.
    fn enable_search(&self, bucket: &str) -> Result<(), Error>;
}

// Blanket implementations for smart pointers

impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn fetch(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Error> {
        self.as_ref().fetch(bucket, key)
    }

    fn put(
        &self,
        bucket: &str,
        key: Option<&str>,
        content: ObjectContent<'_>,
    ) -> Result<String, Error> {
        self.as_ref().put(bucket, key, content)
    }

    fn remove(&self, bucket: &str, key: &str) -> Result<(), Error> {
        self.as_ref().remove(bucket, key)
    }

    fn index(&self, bucket: &str, index: &str, value: &str) -> Result<Vec<String>, Error> {
        self.as_ref().index(bucket, index, value)
    }

    fn search(&self, bucket: &str, query: &SearchQuery) -> Result<Vec<StoredObject>, Error> {
        self.as_ref().search(bucket, query)
    }

    fn map_reduce(&self, bucket: &str, predicate: &Predicate) -> Result<Vec<String>, Error> {
        self.as_ref().map_reduce(bucket, predicate)
    }

    fn enable_search(&self, bucket: &str) -> Result<(), Error> {
        self.as_ref().enable_search(bucket)
    }
}

impl<T: Backend + ?Sized> Backend for Box<T> {
    fn fetch(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Error> {
        self.as_ref().fetch(bucket, key)
    }

    fn put(
        &self,
        bucket: &str,
        key: Option<&str>,
        content: ObjectContent<'_>,
    ) -> Result<String, Error> {
        self.as_ref().put(bucket, key, content)
    }

    fn remove(&self, bucket: &str, key: &str) -> Result<(), Error> {
        self.as_ref().remove(bucket, key)
    }

    fn index(&self, bucket: &str, index: &str, value: &str) -> Result<Vec<String>, Error> {
        self.as_ref().index(bucket, index, value)
    }

    fn search(&self, bucket: &str, query: &SearchQuery) -> Result<Vec<StoredObject>, Error> {
        self.as_ref().search(bucket, query)
    }

    fn map_reduce(&self, bucket: &str, predicate: &Predicate) -> Result<Vec<String>, Error> {
        self.as_ref().map_reduce(bucket, predicate)
    }

    fn enable_search(&self, bucket: &str) -> Result<(), Error> {
        self.as_ref().enable_search(bucket)
    }
}
