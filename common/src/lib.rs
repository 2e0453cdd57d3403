use chrono::{DateTime, Utc};

pub mod constant;
pub mod logger;
pub mod market;
pub mod scheduler;

pub use constant::*;
pub use market::*;
pub use scheduler::*;

/// Price-API token identifier, e.g. "bitcoin".
pub type TokenId = String;

pub fn now_ms() -> i64 {
    let now: DateTime<Utc> = Utc::now();
    now.timestamp_millis()
}
