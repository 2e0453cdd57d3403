use async_trait::async_trait;

use crate::query::RecordQuery;
use crate::records::{NewRecord, RecordKey, StoredRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store error {code}: {body}")]
    Status { code: u16, body: String },
    #[error("unexpected response: {0}")]
    InvalidPayload(&'static str),
    #[error("missing signing credentials for create")]
    MissingCredentials,
}

/// The external record store: append-only, attribute-filterable, durable.
///
/// Records are immutable after creation; there is no update or delete.
/// Freshness on the read side comes from new records plus expiry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a batch of records under the client's signing identity,
    /// returning one key per record, in order.
    async fn create(&self, records: Vec<NewRecord>) -> Result<Vec<RecordKey>, StoreError>;

    /// Fetch records matching the query predicate.
    async fn query(&self, query: RecordQuery) -> Result<Vec<StoredRecord>, StoreError>;
}
