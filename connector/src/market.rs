use std::time::Duration;

use async_trait::async_trait;
use common::TokenId;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::MarketDataConfig;

const HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {code}: {body}")]
    Status { code: u16, body: String },
}

/// Raw per-token row from the markets endpoint. Fields the API omits stay
/// `None` and flow through to the published payload as nulls.
#[derive(Clone, Debug, Deserialize)]
pub struct MarketTicker {
    pub id: TokenId,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
}

#[derive(Serialize)]
struct MarketsQuery<'a> {
    vs_currency: &'a str,
    ids: String,
    sparkline: bool,
}

/// Source of market tickers. Implemented by [`MarketClient`] against the
/// real API and by in-memory stubs in tests.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_markets(&self) -> Result<Vec<MarketTicker>, MarketError>;
}

pub struct MarketClient {
    http: Client,
    endpoint: String,
    vs_currency: String,
    tokens: Vec<TokenId>,
}

impl MarketClient {
    pub fn from_config(cfg: &MarketDataConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent("coinboard-market-connector")
            .build()
            .expect("failed to build reqwest client");
        Self {
            http,
            endpoint: cfg.endpoint.clone(),
            vs_currency: cfg.vs_currency.clone(),
            tokens: cfg.tokens.clone(),
        }
    }
}

#[async_trait]
impl MarketSource for MarketClient {
    async fn fetch_markets(&self) -> Result<Vec<MarketTicker>, MarketError> {
        let url = format!("{}/coins/markets", self.endpoint);
        let params = MarketsQuery {
            vs_currency: &self.vs_currency,
            ids: self.tokens.join(","),
            sparkline: false,
        };
        let resp = self.http.get(&url).query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MarketError::Status {
                code: status.as_u16(),
                body,
            });
        }
        let rows: Vec<MarketTicker> = resp.json().await?;
        Ok(rows)
    }
}
