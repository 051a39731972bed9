//! JSON codec for record payloads.

use bytes::Bytes;

use crate::{Error, Map, Value};

/// Encodes record payloads as JSON objects and decodes them back.
///
/// An empty byte string decodes to an empty payload, matching stores that
/// keep records with no body around (tombstones, link-only records).
///
/// # Example
///
/// ```rust
/// use kvmapper_client::{JsonCodec, Map, Value};
///
/// let mut payload = Map::new();
/// payload.insert("first_name".to_string(), Value::from("soren"));
///
/// let bytes = JsonCodec.encode(&payload).unwrap();
/// assert_eq!(JsonCodec.decode(&bytes).unwrap(), payload);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn encode(&self, payload: &Map) -> Result<Bytes, Error> {
        let bytes = serde_json::to_vec(payload).map_err(|e| Error::Encode {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(bytes))
    }

    pub fn decode(&self, bytes: &Bytes) -> Result<Map, Error> {
        if bytes.is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_slice(bytes).map_err(|e| Error::Decode {
            message: e.to_string(),
        })?;

        match value {
            Value::Map(map) => Ok(map),
            other => Err(Error::Decode {
                message: format!("payload must be an object, found {}", other.type_name()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_decode_to_empty_payload() {
        assert!(JsonCodec.decode(&Bytes::new()).unwrap().is_empty());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = JsonCodec.decode(&Bytes::from_static(b"[1,2]")).unwrap_err();
        assert!(format!("{}", err).contains("array"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = JsonCodec.decode(&Bytes::from_static(b"{nope")).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut payload = Map::new();
        payload.insert("b".to_string(), Value::from(2i64));
        payload.insert("a".to_string(), Value::from(1i64));

        let bytes = JsonCodec.encode(&payload).unwrap();
        assert_eq!(&bytes[..], br#"{"a":1,"b":2}"#);
    }
}
