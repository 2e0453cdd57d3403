/// Base URL for the public market-data REST API.
pub const MARKET_API_BASE: &str = "https://api.coingecko.com/api/v3";
/// Base URL for the record-store HTTP gateway.
pub const RECORD_STORE_API_BASE: &str = "http://127.0.0.1:8545";

/// Quote currency requested from the market API.
pub const DEFAULT_VS_CURRENCY: &str = "usd";
/// Default token universe published and read by the dashboard.
pub const DEFAULT_TOKENS: [&str; 3] = ["bitcoin", "ethereum", "golem"];

/// Publisher cadence: fetch + publish once per minute.
pub const DEFAULT_PUBLISH_INTERVAL_SECS: u64 = 60;
/// Dashboard cadence: re-query and re-render every 15 seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15;

/// Market records expire three hours after creation.
pub const MARKET_RECORD_TTL_SECS: u64 = 3 * 60 * 60;
/// Sketch records are kept for roughly a year.
pub const SKETCH_RECORD_TTL_SECS: u64 = 365 * 24 * 60 * 60;
/// `load` fetches at most this many recent sketches.
pub const SKETCH_LOAD_LIMIT: usize = 10;

/// Attribute carrying the token identifier on market records.
pub const ATTR_TOKEN: &str = "token";
/// Attribute carrying the record kind on sketch records.
pub const ATTR_TYPE: &str = "type";
/// Value of [`ATTR_TYPE`] for sketch records.
pub const SKETCH_TYPE: &str = "sketch";
/// Content type stamped on every JSON payload record.
pub const CONTENT_TYPE_JSON: &str = "application/json";
