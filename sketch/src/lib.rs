use std::cmp::Reverse;
use std::sync::Arc;

use common::constant::{
    ATTR_TYPE, CONTENT_TYPE_JSON, SKETCH_LOAD_LIMIT, SKETCH_RECORD_TTL_SECS, SKETCH_TYPE,
};
use common::now_ms;
use serde::{Deserialize, Serialize};
use store::{json_payload, Attribute, NewRecord, RecordKey, RecordQuery, RecordStore, StoreError};
use tracing::warn;

/// A user-drawn sketch restored from the store.
#[derive(Clone, Debug)]
pub struct Sketch {
    pub key: RecordKey,
    /// Encoded image, e.g. a `data:image/png;base64,...` URL.
    pub image_data: String,
    pub timestamp_ms: i64,
}

#[derive(Serialize, Deserialize)]
struct SketchPayload {
    #[serde(rename = "imageData")]
    image_data: String,
    #[serde(default)]
    timestamp: i64,
}

/// Save/load of sketches as `type = "sketch"` records.
///
/// The store client carries the signing identity used by `save`; `load`
/// filters on an explicit owner address.
pub struct SketchStore {
    store: Arc<dyn RecordStore>,
}

impl SketchStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Persist one sketch and return the new record's key.
    /// Create failures propagate to the caller.
    pub async fn save(&self, image_data: &str) -> Result<RecordKey, StoreError> {
        let payload = SketchPayload {
            image_data: image_data.to_string(),
            timestamp: now_ms(),
        };
        let record = NewRecord {
            payload: json_payload(&payload)?,
            content_type: CONTENT_TYPE_JSON.to_string(),
            attributes: vec![Attribute::new(ATTR_TYPE, SKETCH_TYPE)],
            expires_in_secs: SKETCH_RECORD_TTL_SECS,
        };
        let keys = self.store.create(vec![record]).await?;
        keys.into_iter()
            .next()
            .ok_or(StoreError::InvalidPayload("create returned no key"))
    }

    /// Load the most recent sketches owned by `owner`, newest first.
    ///
    /// Undecodable payloads are dropped one by one; a failed query logs
    /// and yields an empty list.
    pub async fn load(&self, owner: &str) -> Vec<Sketch> {
        let query = RecordQuery::new()
            .attribute_eq(ATTR_TYPE, SKETCH_TYPE)
            .owned_by(owner)
            .with_payload(true)
            .limit(SKETCH_LOAD_LIMIT);
        let records = match self.store.query(query).await {
            Ok(records) => records,
            Err(err) => {
                warn!(?err, owner, "failed to load sketches");
                return Vec::new();
            }
        };
        let mut sketches: Vec<Sketch> = records
            .iter()
            .filter_map(|record| match record.decode_json::<SketchPayload>() {
                Ok(payload) => Some(Sketch {
                    key: record.key.clone(),
                    image_data: payload.image_data,
                    timestamp_ms: payload.timestamp,
                }),
                Err(err) => {
                    warn!(?err, key = %record.key, "skipping undecodable sketch");
                    None
                }
            })
            .collect();
        sketches.sort_by_key(|sketch| Reverse(sketch.timestamp_ms));
        sketches
    }
}
