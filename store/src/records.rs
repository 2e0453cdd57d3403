use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::client::StoreError;

/// Store-assigned, content-derived record identifier.
pub type RecordKey = String;

/// Named string tag on a record, used as an equality filter in queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A record to be created: opaque payload bytes plus filterable attributes
/// and a time-to-live after which the store may discard it.
#[derive(Clone, Debug)]
pub struct NewRecord {
    pub payload: Vec<u8>,
    pub content_type: String,
    pub attributes: Vec<Attribute>,
    pub expires_in_secs: u64,
}

/// A record as returned from a query.
#[derive(Clone, Debug)]
pub struct StoredRecord {
    pub key: RecordKey,
    pub attributes: Vec<Attribute>,
    /// Present only when the query requested payloads.
    pub payload: Option<Vec<u8>>,
}

impl StoredRecord {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }

    /// Decode the payload bytes as UTF-8 JSON into `T`.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let bytes = self
            .payload
            .as_deref()
            .ok_or(StoreError::InvalidPayload("payload not requested"))?;
        let text = std::str::from_utf8(bytes)
            .map_err(|_| StoreError::InvalidPayload("payload is not utf-8"))?;
        serde_json::from_str(text).map_err(|_| StoreError::InvalidPayload("payload is not json"))
    }
}

/// Serialize `value` into JSON payload bytes for a [`NewRecord`].
pub fn json_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|_| StoreError::InvalidPayload("unencodable payload"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    fn record_with(payload: Option<&[u8]>) -> StoredRecord {
        StoredRecord {
            key: "0xabc".to_string(),
            attributes: vec![Attribute::new("kind", "sample")],
            payload: payload.map(|p| p.to_vec()),
        }
    }

    #[test]
    fn attribute_lookup_finds_value() {
        let record = record_with(None);
        assert_eq!(record.attribute("kind"), Some("sample"));
        assert_eq!(record.attribute("missing"), None);
    }

    #[test]
    fn decode_json_round_trips() {
        let record = record_with(Some(br#"{"name":"a","count":2}"#));
        let sample: Sample = record.decode_json().unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "a".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn decode_json_rejects_garbage_and_missing_payload() {
        let garbage = record_with(Some(b"not json"));
        assert!(garbage.decode_json::<Sample>().is_err());
        let absent = record_with(None);
        assert!(absent.decode_json::<Sample>().is_err());
    }
}
