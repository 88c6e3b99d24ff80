//! Binance alpha API response types.
//!
//! Numeric trade fields arrive as strings or JSON numbers depending on the
//! endpoint version, so they are kept as raw values and converted through
//! the precision helper.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::precision::{NumericInput, to_decimal};
use crate::domain::pricing::Trade;
use crate::error::AlphaError;

/// Envelope of the agg-trades endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AggTradesResponse {
    /// Trades, oldest first. Absent when the exchange reports an error.
    #[serde(default)]
    pub data: Option<Vec<AggTrade>>,
    /// Exchange status code, e.g. `"000000"`.
    #[serde(default)]
    pub code: Option<Value>,
    /// Exchange status message.
    #[serde(default)]
    pub message: Option<String>,
}

/// One aggregate trade.
#[derive(Debug, Clone, Deserialize)]
pub struct AggTrade {
    /// Price.
    #[serde(rename = "p", default)]
    pub price: Option<Value>,
    /// Quantity.
    #[serde(rename = "q", default)]
    pub quantity: Option<Value>,
    /// Trade time, epoch milliseconds.
    #[serde(rename = "T", default)]
    pub time: Option<i64>,
}

impl AggTrade {
    /// Convert into a domain trade. Missing price or quantity reads as zero.
    ///
    /// # Errors
    ///
    /// Returns [`AlphaError::UpstreamPayload`] if a field is not numeric.
    pub fn into_trade(self) -> Result<Trade, AlphaError> {
        let price = decimal_field("p", self.price.as_ref())?;
        let quantity = decimal_field("q", self.quantity.as_ref())?;
        Ok(Trade::new(price, quantity, self.time.unwrap_or_default()))
    }
}

fn decimal_field(name: &str, value: Option<&Value>) -> Result<rust_decimal::Decimal, AlphaError> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(rust_decimal::Decimal::ZERO);
    };
    NumericInput::try_from(value)
        .and_then(to_decimal)
        .map_err(|e| AlphaError::UpstreamPayload(format!("trade field '{name}': {e}")))
}

impl AggTradesResponse {
    /// Extract domain trades.
    ///
    /// # Errors
    ///
    /// Returns [`AlphaError::UpstreamPayload`] when `data` is absent or a
    /// trade cannot be converted.
    pub fn into_trades(self) -> Result<Vec<Trade>, AlphaError> {
        let Some(data) = self.data else {
            let detail = self.message.unwrap_or_else(|| "no trade list in response".to_string());
            return Err(AlphaError::UpstreamPayload(detail));
        };
        data.into_iter().map(AggTrade::into_trade).collect()
    }
}
