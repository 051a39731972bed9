//! Links and secondary index entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tagged, directed edge from one record to another.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub bucket: String,
    pub key: String,
    pub tag: String,
}

impl Link {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            tag: tag.into(),
        }
    }

    /// The `<bucket>/<key>` address of the link target.
    pub fn target(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "</{}/{}>; tag=\"{}\"", self.bucket, self.key, self.tag)
    }
}

/// A secondary index entry attached to a record.
///
/// Index names carry their type suffix (`_bin` for binary/string indexes,
/// `_int` for integer indexes) the way the store expects them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub value: String,
}

impl IndexEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name of the binary index maintained for a field.
    pub fn binary_name(field: &str) -> String {
        format!("{}_bin", field)
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
