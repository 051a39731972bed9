//! In-memory backend.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use kvmapper_client::{
    Backend, Bytes, Error, IndexEntry, JsonCodec, Link, Map, ObjectContent, Predicate,
    SearchQuery, StoredObject,
};
use parking_lot::RwLock;

use crate::MemoryConfig;

/// A storage backend that keeps every bucket in process memory.
///
/// Payloads are kept encoded, the way a real store keeps them, so scans and
/// searches parse each record's payload on every run and records with an
/// empty body never match a scan.
///
/// # Example
///
/// ```rust
/// use kvmapper_client::{Client, Map, Value};
/// use kvmapper_memory_store::MemoryBackend;
///
/// let client = Client::new(MemoryBackend::new());
/// let bucket = client.bucket("users");
///
/// let mut payload = Map::new();
/// payload.insert("name".to_string(), Value::from("Alice"));
///
/// let mut record = bucket.new_record(Some("alice"), payload.clone());
/// record.store().unwrap();
///
/// let fetched = bucket.get("alice").unwrap();
/// assert!(fetched.exists());
/// assert_eq!(fetched.data(), &payload);
/// ```
pub struct MemoryBackend {
    config: MemoryConfig,
    codec: JsonCodec,
    buckets: RwLock<HashMap<String, BucketState>>,
}

#[derive(Default)]
struct BucketState {
    records: BTreeMap<String, Entry>,
    search_enabled: bool,
}

struct Entry {
    payload: Bytes,
    links: Vec<Link>,
    indexes: BTreeSet<IndexEntry>,
}

impl MemoryBackend {
    /// A backend with every capability enabled.
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            config,
            codec: JsonCodec,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Number of records in a bucket.
    pub fn len(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .get(bucket)
            .map_or(0, |state| state.records.len())
    }

    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    pub fn search_enabled(&self, bucket: &str) -> bool {
        self.buckets
            .read()
            .get(bucket)
            .is_some_and(|state| state.search_enabled)
    }

    /// Store a raw payload as another client would, bypassing the codec.
    pub fn insert_raw(&self, bucket: &str, key: &str, payload: impl Into<Bytes>) {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .records
            .insert(
                key.to_string(),
                Entry {
                    payload: payload.into(),
                    links: Vec::new(),
                    indexes: BTreeSet::new(),
                },
            );
    }

    /// Drop every bucket and record.
    pub fn clear(&self) {
        self.buckets.write().clear();
    }

    fn to_stored(&self, key: &str, entry: &Entry) -> Result<StoredObject, Error> {
        Ok(StoredObject {
            key: key.to_string(),
            data: self.codec.decode(&entry.payload)?,
            links: entry.links.clone(),
            indexes: entry.indexes.clone(),
        })
    }

    /// Decoded payloads of every non-empty record in a bucket.
    fn payloads(&self, bucket: &str) -> Result<Vec<(String, Map)>, Error> {
        let buckets = self.buckets.read();
        let Some(state) = buckets.get(bucket) else {
            return Ok(Vec::new());
        };

        state
            .records
            .iter()
            .filter(|(_, entry)| !entry.payload.is_empty())
            .map(|(key, entry)| -> Result<(String, Map), Error> {
                Ok((key.clone(), self.codec.decode(&entry.payload)?))
            })
            .collect()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn fetch(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Error> {
        let buckets = self.buckets.read();
        match buckets.get(bucket).and_then(|state| state.records.get(key)) {
            Some(entry) => Ok(Some(self.to_stored(key, entry)?)),
            None => Ok(None),
        }
    }

    fn put(
        &self,
        bucket: &str,
        key: Option<&str>,
        content: ObjectContent<'_>,
    ) -> Result<String, Error> {
        if !self.config.secondary_indexes && !content.indexes.is_empty() {
            return Err(Error::NotSupported {
                operation: "secondary index write",
            });
        }

        let payload = self.codec.encode(content.data)?;
        let key = match key {
            Some(key) => key.to_string(),
            None => uuid::Uuid::new_v4().simple().to_string(),
        };
        log::debug!("Writing {}/{}...", bucket, key);

        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .records
            .insert(
                key.clone(),
                Entry {
                    payload,
                    links: content.links.to_vec(),
                    indexes: content.indexes.clone(),
                },
            );
        Ok(key)
    }

    fn remove(&self, bucket: &str, key: &str) -> Result<(), Error> {
        log::debug!("Removing {}/{}...", bucket, key);
        if let Some(state) = self.buckets.write().get_mut(bucket) {
            state.records.remove(key);
        }
        Ok(())
    }

    fn index(&self, bucket: &str, index: &str, value: &str) -> Result<Vec<String>, Error> {
        if !self.config.secondary_indexes {
            return Err(Error::NotSupported {
                operation: "secondary index query",
            });
        }

        let wanted = IndexEntry::new(index, value);
        let buckets = self.buckets.read();
        Ok(buckets
            .get(bucket)
            .map(|state| {
                state
                    .records
                    .iter()
                    .filter(|(_, entry)| entry.indexes.contains(&wanted))
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn search(&self, bucket: &str, query: &SearchQuery) -> Result<Vec<StoredObject>, Error> {
        if !self.config.search {
            return Err(Error::NotSupported { operation: "search" });
        }

        // A bucket nothing was written to yet has nothing to find.
        let buckets = self.buckets.read();
        let Some(state) = buckets.get(bucket) else {
            return Ok(Vec::new());
        };
        if !state.search_enabled {
            return Err(Error::SearchNotEnabled {
                bucket: bucket.to_string(),
            });
        }

        let mut hits = Vec::new();
        for (key, entry) in &state.records {
            let object = self.to_stored(key, entry)?;
            if query.matches(&object.data) {
                hits.push(object);
            }
        }
        Ok(hits)
    }

    fn map_reduce(&self, bucket: &str, predicate: &Predicate) -> Result<Vec<String>, Error> {
        Ok(self
            .payloads(bucket)?
            .into_iter()
            .filter(|(_, payload)| predicate.matches(payload))
            .map(|(key, _)| key)
            .collect())
    }

    fn enable_search(&self, bucket: &str) -> Result<(), Error> {
        if !self.config.search {
            return Err(Error::NotSupported { operation: "search" });
        }
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .search_enabled = true;
        Ok(())
    }
}
