//! Binance alpha adapter implementing the trade feed and token source ports.

use async_trait::async_trait;
use serde_json::Value;

use crate::application::ports::{TokenSourcePort, TradeFeedPort};
use crate::domain::pricing::Trade;
use crate::error::AlphaError;
use crate::infrastructure::http_client::RetryingHttpClient;

use super::api_types::AggTradesResponse;

/// Aggregate trades endpoint, relative to the REST base.
pub const AGG_TRADES_PATH: &str = "/bapi/defi/v1/public/alpha-trade/agg-trades";

/// Binance alpha REST adapter.
#[derive(Debug, Clone)]
pub struct BinanceAlphaAdapter {
    client: RetryingHttpClient,
    rest_base: String,
}

impl BinanceAlphaAdapter {
    /// Create an adapter for the given REST base URL.
    #[must_use]
    pub fn new(client: RetryingHttpClient, rest_base: &str) -> Self {
        Self {
            client,
            rest_base: rest_base.trim_end_matches('/').to_string(),
        }
    }

    /// Full agg-trades URL.
    #[must_use]
    pub fn agg_trades_url(&self) -> String {
        format!("{}{AGG_TRADES_PATH}", self.rest_base)
    }
}

#[async_trait]
impl TradeFeedPort for BinanceAlphaAdapter {
    async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<Trade>, AlphaError> {
        let params = [("symbol", symbol.to_string()), ("limit", limit.to_string())];
        let body = self.client.get_json(&self.agg_trades_url(), &params).await?;

        let response: AggTradesResponse = serde_json::from_value(body)
            .map_err(|e| AlphaError::UpstreamPayload(format!("agg-trades: {e}")))?;
        let trades = response.into_trades()?;

        tracing::debug!(symbol, count = trades.len(), "Fetched agg trades");
        Ok(trades)
    }
}

#[async_trait]
impl TokenSourcePort for BinanceAlphaAdapter {
    async fn fetch_token_list(&self, url: &str) -> Result<Value, AlphaError> {
        self.client.get_json(url, &[]).await
    }
}
