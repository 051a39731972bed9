//! Mapper configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// What `save` writes when updating an existing record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    /// Overlay the declared plain fields on the stored payload. Stored keys
    /// the object never carried survive; fields removed with
    /// `Object::unset` are dropped.
    #[default]
    Merge,
    /// Write exactly the declared plain fields present on the object.
    Replace,
}

/// Settings for a [`crate::Mapper`].
///
/// ```rust
/// use kvmapper::{MapperConfig, SaveMode};
///
/// let config = MapperConfig::from_json_str(r#"{"save_mode": "replace"}"#).unwrap();
/// assert_eq!(config.save_mode, SaveMode::Replace);
/// assert!(config.auto_enable_search);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    pub save_mode: SaveMode,
    /// Enable search on a searchable type's bucket whenever it is saved.
    pub auto_enable_search: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            save_mode: SaveMode::Merge,
            auto_enable_search: true,
        }
    }
}

impl MapperConfig {
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(|e| Error::Config {
            message: e.to_string(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("could not read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(MapperConfig::from_json_str("{}").unwrap(), MapperConfig::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = MapperConfig::from_json_str(r#"{"retries": 3}"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"save_mode": "replace", "auto_enable_search": false}}"#).unwrap();

        let config = MapperConfig::from_path(file.path()).unwrap();
        assert_eq!(config.save_mode, SaveMode::Replace);
        assert!(!config.auto_enable_search);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MapperConfig::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{}", err).contains("absent.json"));
    }
}
