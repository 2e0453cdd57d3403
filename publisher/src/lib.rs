use std::sync::Arc;
use std::time::Duration;

use common::constant::{
    ATTR_TOKEN, CONTENT_TYPE_JSON, DEFAULT_PUBLISH_INTERVAL_SECS, MARKET_RECORD_TTL_SECS,
};
use common::scheduler::{spawn_periodic, PeriodicHandle};
use common::{now_ms, MarketSnapshot};
use connector::{MarketSource, MarketTicker};
use store::{json_payload, Attribute, NewRecord, RecordKey, RecordStore, StoreError};
use tracing::{info, warn};

#[derive(Clone)]
pub struct PublisherConfig {
    pub interval: Duration,
    pub record_ttl_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_PUBLISH_INTERVAL_SECS),
            record_ttl_secs: MARKET_RECORD_TTL_SECS,
        }
    }
}

/// What one publish cycle did. Lets callers and tests tell "nothing
/// upstream" apart from "fetch failed".
#[derive(Debug)]
pub enum CycleOutcome {
    Published(Vec<RecordKey>),
    EmptyFetch,
    FetchFailed,
    PublishFailed(StoreError),
}

/// Fetch → transform → publish pipeline against the record store.
///
/// Holds only read-only configuration and client handles; no state is
/// carried from one cycle to the next.
pub struct Publisher {
    cfg: PublisherConfig,
    market: Arc<dyn MarketSource>,
    store: Arc<dyn RecordStore>,
}

impl Publisher {
    pub fn new(
        cfg: PublisherConfig,
        market: Arc<dyn MarketSource>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self { cfg, market, store }
    }

    /// Run one cycle. Fetch and publish failures are absorbed and logged
    /// here; the periodic schedule is the only retry.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let tickers = match self.market.fetch_markets().await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(?err, "market fetch failed, skipping publish");
                return CycleOutcome::FetchFailed;
            }
        };
        if tickers.is_empty() {
            info!("no market data to publish");
            return CycleOutcome::EmptyFetch;
        }

        let snapshots = to_snapshots(&tickers, now_ms());
        let records = match build_records(&snapshots, self.cfg.record_ttl_secs) {
            Ok(records) => records,
            Err(err) => {
                warn!(?err, "failed to encode market snapshots");
                return CycleOutcome::PublishFailed(err);
            }
        };
        match self.store.create(records).await {
            Ok(keys) => {
                for (snapshot, key) in snapshots.iter().zip(&keys) {
                    info!(token = %snapshot.token_id, %key, "created market record");
                }
                CycleOutcome::Published(keys)
            }
            Err(err) => {
                warn!(?err, "failed to create market records");
                CycleOutcome::PublishFailed(err)
            }
        }
    }

    /// Publish once immediately, then on every configured tick.
    pub fn spawn(self: Arc<Self>) -> PeriodicHandle {
        let period = self.cfg.interval;
        spawn_periodic("publisher", period, move || {
            let publisher = Arc::clone(&self);
            async move {
                info!("starting publish cycle");
                let outcome = publisher.run_cycle().await;
                info!(?outcome, "publish cycle finished");
                Ok(())
            }
        })
    }
}

/// Map API rows to snapshots, stamping the capture time once per cycle.
/// Missing numeric fields stay `None` and encode as nulls downstream.
pub fn to_snapshots(tickers: &[MarketTicker], captured_ms: i64) -> Vec<MarketSnapshot> {
    tickers
        .iter()
        .map(|row| MarketSnapshot {
            token_id: row.id.clone(),
            price: row.current_price,
            market_cap: row.market_cap,
            change_24h: row.price_change_percentage_24h,
            timestamp_ms: captured_ms,
        })
        .collect()
}

fn build_records(
    snapshots: &[MarketSnapshot],
    ttl_secs: u64,
) -> Result<Vec<NewRecord>, StoreError> {
    snapshots
        .iter()
        .map(|snapshot| {
            Ok(NewRecord {
                payload: json_payload(snapshot)?,
                content_type: CONTENT_TYPE_JSON.to_string(),
                attributes: vec![Attribute::new(ATTR_TOKEN, snapshot.token_id.clone())],
                expires_in_secs: ttl_secs,
            })
        })
        .collect()
}
