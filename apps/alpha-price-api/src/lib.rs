#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::cast_possible_wrap
    )
)]

//! Alpha Price API - Exchange Price Proxy
//!
//! An HTTP service in front of the exchange's alpha market endpoints. It
//! serves the token catalog, reduces recent aggregate trades to last,
//! average and volume-weighted prices, and solves the fee/waste model for
//! the price-difference range a trader can tolerate.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure calculations and data types
//!   - `precision`: Decimal conversion and quantization
//!   - `pricing`: Last / average / VWAP aggregation
//!   - `diff_range`: Fee/waste model solver
//!   - `symbol`: Alpha identifier to pair symbol resolution
//!   - `token`: Token catalog normalization
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Trade feed and token source interfaces
//!   - `services`: Price snapshots, token catalog with fallback
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `binance`: Exchange REST adapter
//!   - `http_client`: Retrying outbound client
//!   - `http`: axum routes and middleware
//!   - `rate_limit`: Sliding window limiter
//!   - `config`, `metrics`, `telemetry`, `server`
//!
//! # Request Flow
//!
//! ```text
//! client ──► request_context ──► rate_limit ──► handler ──► service
//!                                                              │
//!                                  exchange REST ◄── adapter ◄─┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Error types and client-facing error codes.
pub mod error;

/// Domain layer - Pure calculations with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Errors
pub use error::{AlphaError, ErrorCode};

// Domain types
pub use domain::diff_range::{DiffRange, DiffRangeInput, compute_diff_range, compute_fee_usdt};
pub use domain::precision::{NumericInput, Precision, RoundingMode, quantize, to_decimal};
pub use domain::pricing::{PriceMetrics, PriceSnapshot, Trade, aggregate};
pub use domain::symbol::SymbolResolver;
pub use domain::token::{TokenEntry, normalize_token_list};

// Application
pub use application::ports::{TokenSourcePort, TradeFeedPort};
pub use application::services::{PriceService, TokenListOutcome, TokenListService, TokenOrigin};

// Infrastructure config
pub use infrastructure::config::{AppConfig, ConfigError};

// HTTP surface (for integration tests)
pub use infrastructure::binance::BinanceAlphaAdapter;
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::http_client::RetryingHttpClient;
pub use infrastructure::rate_limit::{RateDecision, RateKey, SlidingWindowRateLimiter};

// Server
pub use infrastructure::server::{ApiServer, ServerError, build_app_state};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
