mod client;
mod http;
mod memory;
mod query;
mod records;

use common::constant::RECORD_STORE_API_BASE;

pub use client::{RecordStore, StoreError};
pub use http::HttpRecordStore;
pub use memory::MemoryRecordStore;
pub use query::RecordQuery;
pub use records::{json_payload, Attribute, NewRecord, RecordKey, StoredRecord};

/// Signing identity for record creation, supplied out-of-band.
#[derive(Clone, Debug)]
pub struct StoreCredentials {
    /// Owner/display address records are created under.
    pub address: String,
    /// Secret used to sign create requests.
    pub secret: String,
}

#[derive(Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub credentials: Option<StoreCredentials>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: RECORD_STORE_API_BASE.to_string(),
            credentials: None,
        }
    }
}
