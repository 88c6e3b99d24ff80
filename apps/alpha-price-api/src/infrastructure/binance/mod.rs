//! Binance Alpha Adapter
//!
//! Implements `TradeFeedPort` and `TokenSourcePort` against the Binance
//! alpha REST endpoints, on top of the retrying HTTP client.

mod adapter;
mod api_types;

pub use adapter::{AGG_TRADES_PATH, BinanceAlphaAdapter};
