//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `TradeFeedPort`: Recent aggregate trades for a pair symbol
//! - `TokenSourcePort`: Raw token catalog JSON from a remote URL

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::pricing::Trade;
use crate::error::AlphaError;

/// Source of recent trades.
#[async_trait]
pub trait TradeFeedPort: Send + Sync {
    /// Fetch up to `limit` recent trades for `symbol`, oldest first.
    async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<Trade>, AlphaError>;
}

/// Source of the raw token catalog.
#[async_trait]
pub trait TokenSourcePort: Send + Sync {
    /// Fetch the catalog document at `url` as untyped JSON.
    async fn fetch_token_list(&self, url: &str) -> Result<Value, AlphaError>;
}
