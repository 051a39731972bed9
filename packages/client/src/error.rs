//! Error types for the storage client.
//!
//! These are store-level failures only. Validation and lookup semantics
//! ("no such object", "field required") belong to the mapper.

/// Errors raised by the storage client and its backends.
#[derive(Debug)]
pub enum Error {
    /// A stored payload could not be decoded.
    Decode { message: String },

    /// A payload could not be encoded for storage.
    Encode { message: String },

    /// The backend does not offer this capability (e.g. secondary indexes
    /// on a backend without index support).
    NotSupported { operation: &'static str },

    /// Full-text search was queried on a bucket that never enabled it.
    SearchNotEnabled { bucket: String },

    /// The operation needs a key and the record has none.
    MissingKey { bucket: String },

    /// Transport or backend failure.
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap any backend error.
    pub fn backend(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Backend(e.into())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Decode { message } => write!(f, "decode error: {}", message),
            Error::Encode { message } => write!(f, "encode error: {}", message),
            Error::NotSupported { operation } => {
                write!(f, "operation not supported by backend: {}", operation)
            }
            Error::SearchNotEnabled { bucket } => {
                write!(f, "search is not enabled for bucket '{}'", bucket)
            }
            Error::MissingKey { bucket } => {
                write!(f, "record in bucket '{}' has no key", bucket)
            }
            Error::Backend(e) => write!(f, "backend error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Backend(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Backend(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn search_not_enabled_display() {
        let e = Error::SearchNotEnabled {
            bucket: "users".to_string(),
        };
        assert!(format!("{}", e).contains("'users'"));
    }

    #[test]
    fn not_supported_display() {
        let e = Error::NotSupported {
            operation: "secondary index query",
        };
        let display = format!("{}", e);
        assert!(display.contains("not supported"));
        assert!(display.contains("secondary index query"));
    }

    #[test]
    fn backend_error_has_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let e: Error = io.into();
        assert!(format!("{}", e).contains("connection reset"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn decode_error_source_is_none() {
        let e = Error::Decode {
            message: "unexpected token".to_string(),
        };
        assert_eq!(format!("{}", e), "decode error: unexpected token");
        assert!(StdError::source(&e).is_none());
    }
}
