//! Capabilities of the in-memory backend.

use serde::Deserialize;

/// Which optional store capabilities the backend offers.
///
/// Real stores differ here: secondary indexes need an ordered storage
/// engine, search needs the search service. Turning a capability off makes
/// the backend answer the corresponding calls with `Error::NotSupported`,
/// which is how code paths that depend on them get exercised.
///
/// ```rust
/// use kvmapper_memory_store::MemoryConfig;
///
/// let config: MemoryConfig = serde_json::from_str(r#"{"search": false}"#).unwrap();
/// assert!(config.secondary_indexes);
/// assert!(!config.search);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub secondary_indexes: bool,
    pub search: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            secondary_indexes: true,
            search: true,
        }
    }
}

impl MemoryConfig {
    /// A backend with neither indexes nor search, like a plain
    /// hash-table storage engine.
    pub fn minimal() -> Self {
        Self {
            secondary_indexes: false,
            search: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config: MemoryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MemoryConfig::default());
        assert!(config.secondary_indexes && config.search);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<MemoryConfig, _> = serde_json::from_str(r#"{"replication": 3}"#);
        assert!(result.is_err());
    }
}
