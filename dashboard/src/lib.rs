mod render;

use std::cmp::Reverse;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::constant::{ATTR_TOKEN, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_TOKENS};
use common::scheduler::{spawn_periodic, PeriodicHandle};
use common::{MarketSnapshot, TokenId};
use futures::future::join_all;
use store::{RecordQuery, RecordStore, StoreError, StoredRecord};
use tracing::{debug, info, warn};

pub use render::{format_market_cap, format_price, ConsoleRenderer, RenderSurface};

/// One decoded market record annotated with its store key.
#[derive(Clone, Debug)]
pub struct MarketPoint {
    pub key: String,
    pub snapshot: MarketSnapshot,
}

/// Per-token series, newest first. Rebuilt from scratch every refresh;
/// nothing is merged with or carried over from the previous cycle.
pub type TokenSeries = Vec<MarketPoint>;

#[derive(Clone)]
pub struct DashboardConfig {
    pub tokens: Vec<TokenId>,
    /// Address whose published records the dashboard reads.
    pub owner: String,
    pub interval: Duration,
}

impl DashboardConfig {
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            tokens: DEFAULT_TOKENS.iter().map(|t| t.to_string()).collect(),
            owner: owner.into(),
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

/// Query the store for one token's records, decode and sort them.
///
/// Undecodable payloads are skipped individually; the result is sorted
/// descending by capture timestamp (newest first).
pub async fn fetch_token_series(
    store: &dyn RecordStore,
    owner: &str,
    token: &str,
) -> Result<TokenSeries, StoreError> {
    let records = store
        .query(
            RecordQuery::new()
                .attribute_eq(ATTR_TOKEN, token)
                .owned_by(owner)
                .with_payload(true),
        )
        .await?;
    let mut series: TokenSeries = records.iter().filter_map(decode_point).collect();
    series.sort_by_key(|point| Reverse(point.snapshot.timestamp_ms));
    Ok(series)
}

fn decode_point(record: &StoredRecord) -> Option<MarketPoint> {
    match record.decode_json::<MarketSnapshot>() {
        Ok(snapshot) => Some(MarketPoint {
            key: record.key.clone(),
            snapshot,
        }),
        Err(err) => {
            warn!(?err, key = %record.key, "skipping undecodable market record");
            None
        }
    }
}

/// Read-side pipeline: store queries in, render calls out.
///
/// Created once at startup and driven by the refresh schedule; holds the
/// store handle and the renderer explicitly instead of module globals.
pub struct Dashboard {
    cfg: DashboardConfig,
    store: Arc<dyn RecordStore>,
    renderer: Mutex<Box<dyn RenderSurface>>,
}

impl Dashboard {
    pub fn new(
        cfg: DashboardConfig,
        store: Arc<dyn RecordStore>,
        renderer: Box<dyn RenderSurface>,
    ) -> Self {
        Self {
            cfg,
            store,
            renderer: Mutex::new(renderer),
        }
    }

    /// One refresh: query every configured token concurrently, join, then
    /// render. A failed query logs and contributes an empty series; when
    /// every series is empty no render call is made at all.
    pub async fn refresh(&self) {
        let queries = self.cfg.tokens.iter().map(|token| {
            let store = Arc::clone(&self.store);
            let owner = self.cfg.owner.clone();
            let token = token.clone();
            async move {
                match fetch_token_series(store.as_ref(), &owner, &token).await {
                    Ok(series) => series,
                    Err(err) => {
                        warn!(?err, %token, "token query failed");
                        Vec::new()
                    }
                }
            }
        });
        let series: Vec<TokenSeries> = join_all(queries).await;

        if series.iter().all(|list| list.is_empty()) {
            debug!("no market records yet, skipping render");
            return;
        }

        let latest: Vec<Option<MarketPoint>> =
            series.iter().map(|list| list.first().cloned()).collect();
        let mut renderer = self.renderer.lock().expect("renderer poisoned");
        renderer.render_price_boxes(&latest);
        renderer.render_market_cap_bars(&latest);
        for (token, list) in self.cfg.tokens.iter().zip(&series) {
            if list.is_empty() {
                continue;
            }
            let chronological: Vec<MarketPoint> = list.iter().rev().cloned().collect();
            renderer.render_price_history(token, &chronological);
        }
    }

    /// Refresh once immediately, then on every configured tick.
    pub fn spawn(self: Arc<Self>) -> PeriodicHandle {
        let period = self.cfg.interval;
        spawn_periodic("dashboard", period, move || {
            let dashboard = Arc::clone(&self);
            async move {
                info!("refreshing dashboard");
                dashboard.refresh().await;
                Ok(())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::constant::CONTENT_TYPE_JSON;
    use store::{json_payload, Attribute, MemoryRecordStore, NewRecord, RecordKey};

    const OWNER: &str = "0xOWNER";

    fn market_record(token: &str, timestamp_ms: i64, price: f64) -> NewRecord {
        let snapshot = MarketSnapshot {
            token_id: token.to_string(),
            price: Some(price),
            market_cap: Some(price * 1e9),
            change_24h: Some(0.5),
            timestamp_ms,
        };
        NewRecord {
            payload: json_payload(&snapshot).unwrap(),
            content_type: CONTENT_TYPE_JSON.to_string(),
            attributes: vec![Attribute::new(ATTR_TOKEN, token)],
            expires_in_secs: 3600,
        }
    }

    fn garbage_record(token: &str) -> NewRecord {
        NewRecord {
            payload: b"not json at all".to_vec(),
            content_type: CONTENT_TYPE_JSON.to_string(),
            attributes: vec![Attribute::new(ATTR_TOKEN, token)],
            expires_in_secs: 3600,
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        price_box_calls: usize,
        market_cap_calls: usize,
        history_calls: Vec<(String, Vec<i64>)>,
        boxes_seen: Vec<Option<String>>,
    }

    impl RenderSurface for Arc<Mutex<RecordingRenderer>> {
        fn render_price_boxes(&mut self, latest: &[Option<MarketPoint>]) {
            let mut inner = self.lock().unwrap();
            inner.price_box_calls += 1;
            inner.boxes_seen = latest
                .iter()
                .map(|point| point.as_ref().map(|p| p.snapshot.token_id.clone()))
                .collect();
        }

        fn render_market_cap_bars(&mut self, _latest: &[Option<MarketPoint>]) {
            self.lock().unwrap().market_cap_calls += 1;
        }

        fn render_price_history(&mut self, token: &str, series: &[MarketPoint]) {
            let timestamps = series.iter().map(|p| p.snapshot.timestamp_ms).collect();
            self.lock()
                .unwrap()
                .history_calls
                .push((token.to_string(), timestamps));
        }
    }

    /// Delegates to an inner store but fails queries for one token.
    struct FlakyStore {
        inner: MemoryRecordStore,
        poisoned_token: String,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn create(&self, records: Vec<NewRecord>) -> Result<Vec<RecordKey>, StoreError> {
            self.inner.create(records).await
        }

        async fn query(&self, query: RecordQuery) -> Result<Vec<StoredRecord>, StoreError> {
            let poisoned = query
                .attributes
                .iter()
                .any(|attr| attr.key == ATTR_TOKEN && attr.value == self.poisoned_token);
            if poisoned {
                return Err(StoreError::Status {
                    code: 502,
                    body: "query backend down".to_string(),
                });
            }
            self.inner.query(query).await
        }
    }

    fn dashboard_with(
        store: Arc<dyn RecordStore>,
    ) -> (Dashboard, Arc<Mutex<RecordingRenderer>>) {
        let recorder = Arc::new(Mutex::new(RecordingRenderer::default()));
        let dashboard = Dashboard::new(
            DashboardConfig::for_owner(OWNER),
            store,
            Box::new(recorder.clone()),
        );
        (dashboard, recorder)
    }

    #[tokio::test]
    async fn series_is_sorted_newest_first() {
        let store = MemoryRecordStore::new(OWNER);
        store
            .create(vec![
                market_record("bitcoin", 1_000, 1.0),
                market_record("bitcoin", 3_000, 3.0),
                market_record("bitcoin", 2_000, 2.0),
            ])
            .await
            .unwrap();

        let series = fetch_token_series(&store, OWNER, "bitcoin").await.unwrap();
        let stamps: Vec<i64> = series.iter().map(|p| p.snapshot.timestamp_ms).collect();
        assert_eq!(stamps, vec![3_000, 2_000, 1_000]);
        assert!(stamps.windows(2).all(|w| w[0] > w[1]));
        assert!(series.iter().all(|p| !p.key.is_empty()));
    }

    #[tokio::test]
    async fn undecodable_records_are_skipped_individually() {
        let store = MemoryRecordStore::new(OWNER);
        store
            .create(vec![
                market_record("bitcoin", 1_000, 1.0),
                garbage_record("bitcoin"),
                market_record("bitcoin", 2_000, 2.0),
            ])
            .await
            .unwrap();

        let series = fetch_token_series(&store, OWNER, "bitcoin").await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].snapshot.timestamp_ms, 2_000);
    }

    #[tokio::test]
    async fn other_owners_records_are_invisible() {
        let store = MemoryRecordStore::new(OWNER);
        store.create_as("0xSOMEONE", vec![market_record("bitcoin", 1_000, 1.0)]);
        let series = fetch_token_series(&store, OWNER, "bitcoin").await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn empty_store_renders_nothing() {
        let (dashboard, recorder) = dashboard_with(Arc::new(MemoryRecordStore::new(OWNER)));
        dashboard.refresh().await;
        let inner = recorder.lock().unwrap();
        assert_eq!(inner.price_box_calls, 0);
        assert_eq!(inner.market_cap_calls, 0);
        assert!(inner.history_calls.is_empty());
    }

    #[tokio::test]
    async fn refresh_renders_history_in_chronological_order() {
        let store = Arc::new(MemoryRecordStore::new(OWNER));
        store
            .create(vec![
                market_record("bitcoin", 1_000, 1.0),
                market_record("bitcoin", 2_000, 2.0),
                market_record("ethereum", 1_500, 10.0),
            ])
            .await
            .unwrap();

        let (dashboard, recorder) = dashboard_with(store);
        dashboard.refresh().await;

        let inner = recorder.lock().unwrap();
        assert_eq!(inner.price_box_calls, 1);
        assert_eq!(inner.market_cap_calls, 1);
        // bitcoin and ethereum have data, golem does not
        assert_eq!(inner.history_calls.len(), 2);
        let (token, stamps) = &inner.history_calls[0];
        assert_eq!(token, "bitcoin");
        assert_eq!(stamps, &vec![1_000, 2_000]);
        assert_eq!(
            inner.boxes_seen,
            vec![
                Some("bitcoin".to_string()),
                Some("ethereum".to_string()),
                None
            ]
        );
    }

    #[tokio::test]
    async fn one_failing_token_does_not_block_the_others() {
        let inner = MemoryRecordStore::new(OWNER);
        inner
            .create(vec![
                market_record("bitcoin", 1_000, 1.0),
                market_record("ethereum", 1_500, 10.0),
            ])
            .await
            .unwrap();
        let store = Arc::new(FlakyStore {
            inner,
            poisoned_token: "ethereum".to_string(),
        });

        let (dashboard, recorder) = dashboard_with(store);
        dashboard.refresh().await;

        let inner = recorder.lock().unwrap();
        assert_eq!(inner.price_box_calls, 1);
        assert_eq!(
            inner.boxes_seen,
            vec![Some("bitcoin".to_string()), None, None]
        );
        assert_eq!(inner.history_calls.len(), 1);
        assert_eq!(inner.history_calls[0].0, "bitcoin");
    }
}
