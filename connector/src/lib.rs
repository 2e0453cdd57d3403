mod market;

use common::constant::{DEFAULT_TOKENS, DEFAULT_VS_CURRENCY, MARKET_API_BASE};
use common::TokenId;

pub use market::{MarketClient, MarketError, MarketSource, MarketTicker};

#[derive(Clone)]
pub struct MarketDataConfig {
    pub tokens: Vec<TokenId>,
    pub vs_currency: String,
    pub endpoint: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            tokens: DEFAULT_TOKENS.iter().map(|t| t.to_string()).collect(),
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            endpoint: MARKET_API_BASE.to_string(),
        }
    }
}
