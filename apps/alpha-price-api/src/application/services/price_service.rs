//! Price Service
//!
//! Resolves an alpha identifier to a pair symbol, pulls the recent trade
//! window from the feed, and reduces it to a [`PriceSnapshot`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::application::ports::TradeFeedPort;
use crate::domain::precision::Precision;
use crate::domain::pricing::{PriceSnapshot, aggregate};
use crate::domain::symbol::SymbolResolver;
use crate::error::AlphaError;

/// Computes price snapshots from recent trades.
pub struct PriceService<F: TradeFeedPort> {
    feed: Arc<F>,
    resolver: Arc<SymbolResolver>,
    precision: Precision,
    trades_limit: u32,
}

impl<F: TradeFeedPort> PriceService<F> {
    /// Create a price service.
    #[must_use]
    pub const fn new(
        feed: Arc<F>,
        resolver: Arc<SymbolResolver>,
        precision: Precision,
        trades_limit: u32,
    ) -> Self {
        Self {
            feed,
            resolver,
            precision,
            trades_limit,
        }
    }

    /// Number of trades requested per snapshot.
    #[must_use]
    pub const fn trades_limit(&self) -> u32 {
        self.trades_limit
    }

    /// Build a fresh snapshot for `alpha_id`.
    ///
    /// # Errors
    ///
    /// - [`AlphaError::InvalidIdentifier`] for a blank identifier
    /// - [`AlphaError::SymbolResolution`] if resolution yields nothing usable
    /// - [`AlphaError::NoTradesAvailable`] if the feed returned no trades
    /// - any upstream error surfaced by the feed
    #[instrument(skip(self), fields(symbol))]
    pub async fn fetch_price(&self, alpha_id: &str) -> Result<PriceSnapshot, AlphaError> {
        let symbol = self.resolver.resolve(alpha_id)?;
        if symbol.is_empty() || symbol == self.resolver.suffix() {
            return Err(AlphaError::SymbolResolution(alpha_id.to_string()));
        }
        tracing::Span::current().record("symbol", symbol.as_str());

        let trades = self.feed.recent_trades(&symbol, self.trades_limit).await?;
        debug!(count = trades.len(), "Fetched trade window");

        let metrics = aggregate(&trades, &self.precision)?;
        Ok(PriceSnapshot::new(
            symbol,
            metrics,
            Utc::now().timestamp_millis(),
        ))
    }
}
