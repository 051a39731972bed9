//! Client, bucket and map/reduce handles over a `Backend`.

use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::{Error, Map, Predicate, Record, SearchQuery};

/// Shared handle on a storage backend.
///
/// Cloning is cheap; all clones talk to the same backend.
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
}

impl Client {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_arc(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn bucket(&self, name: impl Into<String>) -> Bucket {
        Bucket {
            client: self.clone(),
            name: name.into(),
        }
    }

    /// Keys of records in `bucket` carrying `index = value`.
    pub fn index(&self, bucket: &str, index: &str, value: &str) -> Result<Vec<String>, Error> {
        log::debug!("Index query {}/{}={}...", bucket, index, value);
        self.backend.index(bucket, index, value)
    }

    /// Records in `bucket` matching a search query.
    pub fn search(&self, bucket: &str, query: &SearchQuery) -> Result<Vec<Record>, Error> {
        log::debug!("Search {}: {}...", bucket, query);
        let handle = self.bucket(bucket);
        Ok(self
            .backend
            .search(bucket, query)?
            .into_iter()
            .map(|object| Record::stored(handle.clone(), object))
            .collect())
    }

    /// Start a map/reduce job over every record in `bucket`.
    pub fn map_reduce(&self, bucket: impl Into<String>) -> MapReduce {
        MapReduce {
            client: self.clone(),
            bucket: bucket.into(),
            predicate: Predicate::All(Vec::new()),
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// A named partition of the store.
#[derive(Clone, Debug)]
pub struct Bucket {
    client: Client,
    name: String,
}

impl Bucket {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch a record. Missing keys yield a record whose `exists()` is false.
    pub fn get(&self, key: &str) -> Result<Record, Error> {
        log::debug!("Fetching {}/{}...", self.name, key);
        Ok(match self.client.backend.fetch(&self.name, key)? {
            Some(object) => Record::stored(self.clone(), object),
            None => Record::missing(self.clone(), key),
        })
    }

    /// A new, not yet stored record. `key = None` lets the store pick one.
    pub fn new_record(&self, key: Option<&str>, data: Map) -> Record {
        Record::new(self.clone(), key.map(str::to_string), data)
    }

    pub fn enable_search(&self) -> Result<(), Error> {
        self.client.backend.enable_search(&self.name)
    }
}

/// A pending map/reduce job. Nothing runs until [`MapReduce::run`].
#[derive(Clone, Debug)]
pub struct MapReduce {
    client: Client,
    bucket: String,
    predicate: Predicate,
}

impl MapReduce {
    /// Add a filter; filters accumulate as a conjunction.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = self.predicate.and(predicate);
        self
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Submit the job and collect the keys of matching records.
    pub fn run(&self) -> Result<Vec<String>, Error> {
        log::debug!("Map/reduce over {}...", self.bucket);
        log::trace!("Map phase:\n{}", self.predicate.to_javascript());
        self.client.backend.map_reduce(&self.bucket, &self.predicate)
    }
}
