use serde::{Deserialize, Serialize};

use crate::TokenId;

/// One published market observation for a token.
///
/// Numeric fields stay optional: when the upstream API omits a value it is
/// encoded as `null` in the record payload rather than coerced to zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(rename = "tokenId")]
    pub token_id: TokenId,
    pub price: Option<f64>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "change24h")]
    pub change_24h: Option<f64>,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}
