//! Price Aggregation
//!
//! Reduces a window of recent trades to three reference prices:
//!
//! - **last**: price of the final trade in chronological order
//! - **average**: arithmetic mean of trade prices
//! - **vwap**: Σ(price·quantity) / Σ(quantity), or `last` when no volume traded
//!
//! Sums are accumulated at full precision; only the three outputs are
//! quantized.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::precision::Precision;
use crate::error::AlphaError;

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution price in quote currency.
    pub price: Decimal,
    /// Executed base quantity.
    pub quantity: Decimal,
    /// Execution time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Trade {
    /// Create a new trade.
    #[must_use]
    pub const fn new(price: Decimal, quantity: Decimal, timestamp: i64) -> Self {
        Self {
            price,
            quantity,
            timestamp,
        }
    }
}

/// Quantized reference prices for a trade window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceMetrics {
    /// Last traded price.
    pub last: Decimal,
    /// Mean trade price.
    pub average: Decimal,
    /// Volume-weighted average price.
    pub vwap: Decimal,
}

/// Reference prices for a symbol at capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSnapshot {
    /// Tradable symbol, e.g. `KOGEUSDT`.
    pub symbol: String,
    /// Last traded price.
    pub last: Decimal,
    /// Mean trade price.
    pub average: Decimal,
    /// Volume-weighted average price.
    pub vwap: Decimal,
    /// When the snapshot was taken (not derived from trades).
    pub timestamp_ms: i64,
}

impl PriceSnapshot {
    /// Assemble a snapshot from computed metrics.
    #[must_use]
    pub fn new(symbol: impl Into<String>, metrics: PriceMetrics, timestamp_ms: i64) -> Self {
        Self {
            symbol: symbol.into(),
            last: metrics.last,
            average: metrics.average,
            vwap: metrics.vwap,
            timestamp_ms,
        }
    }
}

/// Aggregate trades into last, average and VWAP prices.
///
/// # Errors
///
/// Returns [`AlphaError::NoTradesAvailable`] when `trades` is empty, and
/// [`AlphaError::UpstreamPayload`] when the sums overflow a `Decimal`.
pub fn aggregate(trades: &[Trade], precision: &Precision) -> Result<PriceMetrics, AlphaError> {
    let Some(last) = trades.last() else {
        return Err(AlphaError::NoTradesAvailable);
    };

    let mut sum_price = Decimal::ZERO;
    let mut sum_notional = Decimal::ZERO;
    let mut sum_quantity = Decimal::ZERO;

    for trade in trades {
        sum_price = sum_price
            .checked_add(trade.price)
            .ok_or_else(|| overflow("price sum"))?;
        sum_notional = trade
            .price
            .checked_mul(trade.quantity)
            .and_then(|notional| sum_notional.checked_add(notional))
            .ok_or_else(|| overflow("notional sum"))?;
        sum_quantity = sum_quantity
            .checked_add(trade.quantity)
            .ok_or_else(|| overflow("quantity sum"))?;
    }

    let average = sum_price
        .checked_div(Decimal::from(trades.len()))
        .ok_or_else(|| overflow("average"))?;
    let vwap = if sum_quantity > Decimal::ZERO {
        sum_notional
            .checked_div(sum_quantity)
            .ok_or_else(|| overflow("vwap"))?
    } else {
        last.price
    };

    Ok(PriceMetrics {
        last: precision.quantize(last.price),
        average: precision.quantize(average),
        vwap: precision.quantize(vwap),
    })
}

fn overflow(what: &str) -> AlphaError {
    AlphaError::UpstreamPayload(format!("trade {what} overflowed"))
}
