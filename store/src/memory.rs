use std::sync::Mutex;

use async_trait::async_trait;
use common::now_ms;
use sha2::{Digest, Sha256};

use crate::client::{RecordStore, StoreError};
use crate::query::RecordQuery;
use crate::records::{NewRecord, RecordKey, StoredRecord};

/// In-process record store used by tests and `--mock` runs.
///
/// Keys are content hashes over payload and attributes, records are
/// append-only, and expiry is enforced at query time.
pub struct MemoryRecordStore {
    owner: String,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: Vec<OwnedRecord>,
    create_batches: Vec<usize>,
}

struct OwnedRecord {
    record: StoredRecord,
    owner: String,
    expires_at_ms: i64,
}

impl MemoryRecordStore {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Sizes of the create batches received so far.
    pub fn create_batches(&self) -> Vec<usize> {
        self.inner.lock().expect("memory store poisoned").create_batches.clone()
    }

    /// Append records under an explicit owner, bypassing the client identity.
    /// Lets tests seed data for addresses other than the configured one.
    pub fn create_as(&self, owner: &str, records: Vec<NewRecord>) -> Vec<RecordKey> {
        let now = now_ms();
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.create_batches.push(records.len());
        let mut keys = Vec::with_capacity(records.len());
        for record in records {
            let key = content_key(&record);
            let expires_at_ms = now.saturating_add(record.expires_in_secs as i64 * 1000);
            inner.records.push(OwnedRecord {
                record: StoredRecord {
                    key: key.clone(),
                    attributes: record.attributes,
                    payload: Some(record.payload),
                },
                owner: owner.to_string(),
                expires_at_ms,
            });
            keys.push(key);
        }
        keys
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, records: Vec<NewRecord>) -> Result<Vec<RecordKey>, StoreError> {
        Ok(self.create_as(&self.owner, records))
    }

    async fn query(&self, query: RecordQuery) -> Result<Vec<StoredRecord>, StoreError> {
        let now = now_ms();
        let inner = self.inner.lock().expect("memory store poisoned");
        let mut out = Vec::new();
        for entry in &inner.records {
            if entry.expires_at_ms <= now {
                continue;
            }
            if let Some(owner) = &query.owner {
                if *owner != entry.owner {
                    continue;
                }
            }
            let matches = query
                .attributes
                .iter()
                .all(|want| entry.record.attribute(&want.key) == Some(want.value.as_str()));
            if !matches {
                continue;
            }
            let mut record = entry.record.clone();
            if !query.with_payload {
                record.payload = None;
            }
            out.push(record);
        }
        if let Some(limit) = query.limit {
            // The remote store caps results to the most recent records;
            // insertion order stands in for creation order here.
            let skip = out.len().saturating_sub(limit);
            out = out.split_off(skip);
        }
        Ok(out)
    }
}

fn content_key(record: &NewRecord) -> RecordKey {
    let mut hasher = Sha256::new();
    hasher.update(&record.payload);
    for attr in &record.attributes {
        hasher.update(attr.key.as_bytes());
        hasher.update(attr.value.as_bytes());
    }
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{json_payload, Attribute};

    fn record(token: &str, body: &str) -> NewRecord {
        NewRecord {
            payload: json_payload(&serde_json::json!({ "v": body })).unwrap(),
            content_type: "application/json".to_string(),
            attributes: vec![Attribute::new("token", token)],
            expires_in_secs: 3600,
        }
    }

    #[tokio::test]
    async fn keys_are_content_addressed() {
        let store = MemoryRecordStore::new("0xOWNER");
        let keys_a = store.create(vec![record("bitcoin", "a")]).await.unwrap();
        let keys_b = store.create(vec![record("bitcoin", "a")]).await.unwrap();
        let keys_c = store.create(vec![record("bitcoin", "b")]).await.unwrap();
        assert_eq!(keys_a, keys_b);
        assert_ne!(keys_a, keys_c);
        assert!(keys_a[0].starts_with("0x"));
    }

    #[tokio::test]
    async fn query_filters_on_attribute_and_owner() {
        let store = MemoryRecordStore::new("0xOWNER");
        store
            .create(vec![record("bitcoin", "a"), record("ethereum", "b")])
            .await
            .unwrap();
        store.create_as("0xOTHER", vec![record("bitcoin", "c")]);

        let mine = store
            .query(
                RecordQuery::new()
                    .attribute_eq("token", "bitcoin")
                    .owned_by("0xOWNER")
                    .with_payload(true),
            )
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].attribute("token"), Some("bitcoin"));
        assert!(mine[0].payload.is_some());
    }

    #[tokio::test]
    async fn payload_is_withheld_unless_requested() {
        let store = MemoryRecordStore::new("0xOWNER");
        store.create(vec![record("bitcoin", "a")]).await.unwrap();
        let rows = store
            .query(RecordQuery::new().attribute_eq("token", "bitcoin"))
            .await
            .unwrap();
        assert!(rows[0].payload.is_none());
    }

    #[tokio::test]
    async fn limit_keeps_the_most_recent_records() {
        let store = MemoryRecordStore::new("0xOWNER");
        for idx in 0..5 {
            store
                .create(vec![record("bitcoin", &format!("v{idx}"))])
                .await
                .unwrap();
        }
        let rows = store
            .query(
                RecordQuery::new()
                    .attribute_eq("token", "bitcoin")
                    .with_payload(true)
                    .limit(2),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let last: serde_json::Value = rows[1].decode_json().unwrap();
        assert_eq!(last["v"], "v4");
    }

    #[tokio::test]
    async fn create_batches_are_recorded() {
        let store = MemoryRecordStore::new("0xOWNER");
        store
            .create(vec![record("bitcoin", "a"), record("ethereum", "b")])
            .await
            .unwrap();
        store.create(vec![record("golem", "c")]).await.unwrap();
        assert_eq!(store.create_batches(), vec![2, 1]);
    }
}
