//! The Record type - a handle on one stored object.

use std::collections::BTreeSet;

use crate::backend::{ObjectContent, StoredObject};
use crate::{Bucket, Error, IndexEntry, Link, Map};

/// A record in a bucket, possibly not yet (or no longer) stored.
///
/// A `Record` is a local copy: mutations touch only the copy until
/// [`Record::store`] writes payload, links and indexes in one `put`.
///
/// # Example
///
/// ```rust,ignore
/// let bucket = client.bucket("users");
/// let mut record = bucket.new_record(None, payload);
/// record.add_index("manager_bin", "users/jane");
/// let key = record.store()?.to_string();
///
/// let fetched = bucket.get(&key)?;
/// assert!(fetched.exists());
/// ```
#[derive(Clone, Debug)]
pub struct Record {
    bucket: Bucket,
    key: Option<String>,
    data: Map,
    links: Vec<Link>,
    indexes: BTreeSet<IndexEntry>,
    exists: bool,
}

impl Record {
    // === Construction ===

    pub(crate) fn new(bucket: Bucket, key: Option<String>, data: Map) -> Self {
        Self {
            bucket,
            key,
            data,
            links: Vec::new(),
            indexes: BTreeSet::new(),
            exists: false,
        }
    }

    pub(crate) fn missing(bucket: Bucket, key: &str) -> Self {
        Self::new(bucket, Some(key.to_string()), Map::new())
    }

    pub(crate) fn stored(bucket: Bucket, object: StoredObject) -> Self {
        Self {
            bucket,
            key: Some(object.key),
            data: object.data,
            links: object.links,
            indexes: object.indexes,
            exists: true,
        }
    }

    // === Inspection ===

    /// Whether the record currently exists in the store.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub fn data(&self) -> &Map {
        &self.data
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn indexes(&self) -> &BTreeSet<IndexEntry> {
        &self.indexes
    }

    // === Local mutation ===

    pub fn set_data(&mut self, data: Map) {
        self.data = data;
    }

    /// Replace the full link set.
    pub fn set_links(&mut self, links: Vec<Link>) {
        self.links = links;
    }

    pub fn add_index(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.indexes.insert(IndexEntry::new(name, value));
    }

    /// Remove an index entry. Returns whether it was present.
    pub fn remove_index(&mut self, name: &str, value: &str) -> bool {
        self.indexes.remove(&IndexEntry::new(name, value))
    }

    // === Store round trips ===

    /// Write the record. Adopts the store-assigned key on first write.
    pub fn store(&mut self) -> Result<&str, Error> {
        let content = ObjectContent {
            data: &self.data,
            links: &self.links,
            indexes: &self.indexes,
        };
        let key = self
            .bucket
            .client()
            .backend()
            .put(self.bucket.name(), self.key.as_deref(), content)?;

        self.exists = true;
        Ok(self.key.insert(key).as_str())
    }

    /// Remove the record from the store.
    pub fn delete(&mut self) -> Result<(), Error> {
        let key = self.key.as_deref().ok_or_else(|| Error::MissingKey {
            bucket: self.bucket.name().to_string(),
        })?;
        self.bucket.client().backend().remove(self.bucket.name(), key)?;
        self.exists = false;
        Ok(())
    }
}
