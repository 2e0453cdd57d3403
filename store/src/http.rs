use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;

use crate::client::{RecordStore, StoreError};
use crate::query::RecordQuery;
use crate::records::{Attribute, NewRecord, RecordKey, StoredRecord};
use crate::{StoreConfig, StoreCredentials};

type HmacSha256 = Hmac<Sha256>;

const HTTP_TIMEOUT_SECS: u64 = 10;
const ADDRESS_HEADER: &str = "X-Store-Address";
const SIGNATURE_HEADER: &str = "X-Store-Signature";

/// Record-store client over the store's HTTP gateway.
///
/// Creates are signed with the configured credentials; queries are
/// unauthenticated reads.
pub struct HttpRecordStore {
    http: Client,
    endpoint: String,
    credentials: Option<StoreCredentials>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    owner: &'a str,
    records: Vec<WireNewRecord>,
}

#[derive(Serialize)]
struct WireNewRecord {
    /// Hex-encoded payload bytes.
    payload: String,
    #[serde(rename = "contentType")]
    content_type: String,
    attributes: Vec<Attribute>,
    #[serde(rename = "expiresIn")]
    expires_in_secs: u64,
}

#[derive(Deserialize)]
struct CreateResponse {
    keys: Vec<RecordKey>,
}

#[derive(Serialize)]
struct QueryRequest {
    attributes: Vec<Attribute>,
    owner: Option<String>,
    #[serde(rename = "withPayload")]
    with_payload: bool,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct QueryResponse {
    records: Vec<WireStoredRecord>,
}

#[derive(Deserialize)]
struct WireStoredRecord {
    key: RecordKey,
    attributes: Vec<Attribute>,
    /// Hex-encoded payload bytes, present when requested.
    payload: Option<String>,
}

impl HttpRecordStore {
    pub fn from_config(cfg: &StoreConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent("coinboard-record-store")
            .build()
            .expect("failed to build reqwest client");
        Self {
            http,
            endpoint: cfg.endpoint.clone(),
            credentials: cfg.credentials.clone(),
        }
    }

    fn require_credentials(&self) -> Result<&StoreCredentials, StoreError> {
        self.credentials
            .as_ref()
            .ok_or(StoreError::MissingCredentials)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn create(&self, records: Vec<NewRecord>) -> Result<Vec<RecordKey>, StoreError> {
        let creds = self.require_credentials()?;
        let request = CreateRequest {
            owner: &creds.address,
            records: records.into_iter().map(wire_new_record).collect(),
        };
        let body = serde_json::to_string(&request)
            .map_err(|_| StoreError::InvalidPayload("encode create request"))?;
        let signature = sign_payload(&creds.secret, &body);

        let mut headers = HeaderMap::new();
        headers.insert(
            ADDRESS_HEADER,
            HeaderValue::from_str(&creds.address)
                .map_err(|_| StoreError::InvalidPayload("owner address"))?,
        );
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&signature)
                .map_err(|_| StoreError::InvalidPayload("signature"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let url = format!("{}/records", self.endpoint);
        let resp = self.http.post(&url).headers(headers).body(body).send().await?;
        let status = resp.status();
        let payload = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
                body: payload,
            });
        }
        let decoded: CreateResponse = serde_json::from_str(&payload).map_err(|err| {
            warn!(?err, endpoint = %url, "failed to decode create response");
            StoreError::InvalidPayload("decode create response")
        })?;
        Ok(decoded.keys)
    }

    async fn query(&self, query: RecordQuery) -> Result<Vec<StoredRecord>, StoreError> {
        let request = QueryRequest {
            attributes: query.attributes,
            owner: query.owner,
            with_payload: query.with_payload,
            limit: query.limit,
        };
        let url = format!("{}/records/query", self.endpoint);
        let resp = self.http.post(&url).json(&request).send().await?;
        let status = resp.status();
        let payload = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
                body: payload,
            });
        }
        let decoded: QueryResponse = serde_json::from_str(&payload).map_err(|err| {
            warn!(?err, endpoint = %url, "failed to decode query response");
            StoreError::InvalidPayload("decode query response")
        })?;
        decoded.records.into_iter().map(stored_record).collect()
    }
}

fn wire_new_record(record: NewRecord) -> WireNewRecord {
    WireNewRecord {
        payload: hex::encode(&record.payload),
        content_type: record.content_type,
        attributes: record.attributes,
        expires_in_secs: record.expires_in_secs,
    }
}

fn stored_record(wire: WireStoredRecord) -> Result<StoredRecord, StoreError> {
    let payload = match wire.payload {
        Some(encoded) => Some(
            hex::decode(encoded).map_err(|_| StoreError::InvalidPayload("payload hex"))?,
        ),
        None => None,
    };
    Ok(StoredRecord {
        key: wire.key,
        attributes: wire.attributes,
        payload,
    })
}

fn sign_payload(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_hex() {
        let sig = sign_payload("secret", "payload");
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, sign_payload("secret", "payload"));
        assert_ne!(sig, sign_payload("other", "payload"));
    }

    #[test]
    fn create_without_credentials_is_rejected() {
        let store = HttpRecordStore::from_config(&StoreConfig::default());
        let err = store.require_credentials().unwrap_err();
        assert!(matches!(err, StoreError::MissingCredentials));
    }
}
