//! Error types for the mapper.

use kvmapper_client::Value;

/// A field value failed to clean or validate.
///
/// Raised synchronously from `Object::clean` and `Object::save`; never
/// swallowed by the mapper.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("\"{field}\" is required, but not set")]
    Required { field: String },

    #[error("{field} attribute of {model} must hold other objects")]
    NotAnObject { field: String, model: String },

    #[error("{field} attribute of {model} references an object that was never saved")]
    UnsavedReference { field: String, model: String },

    #[error("{field} attribute of {model} is not a link field but holds objects")]
    UnexpectedObjects { field: String, model: String },

    #[error("{value} could not be cast to {target}")]
    Coercion { value: Value, target: &'static str },

    #[error("expected {expected}, found {found}")]
    Type { expected: &'static str, found: Value },
}

/// An object type could not be defined or registered.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("field \"{field}\" is declared twice on {model}")]
    DuplicateField { model: String, field: String },

    #[error("{model} has no bucket name")]
    EmptyBucket { model: String },

    #[error("bucket \"{bucket}\" already belongs to {existing}")]
    DuplicateBucket { bucket: String, existing: String },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("no object with key \"{key}\" in bucket \"{bucket}\"")]
    NoSuchObject { bucket: String, key: String },

    #[error("no such field: {field}")]
    NoSuchField { field: String },

    #[error("\"{field}\" is a link field, resolve it with related()")]
    LinkField { field: String },

    #[error("\"{field}\" is not a link field")]
    NotALinkField { field: String },

    #[error("no object type registered for bucket \"{bucket}\"")]
    UnregisteredBucket { bucket: String },

    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("object {bucket}/{key} has been deleted")]
    Deleted { bucket: String, key: String },

    #[error("{0}")]
    Definition(#[from] DefinitionError),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("store error: {0}")]
    Store(#[from] kvmapper_client::Error),

    /// An error raised by a lifecycle hook, passed through untouched.
    #[error(transparent)]
    Hook(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error raised from a hook.
    pub fn hook(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Hook(e.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
