//! Error taxonomy for the alpha price API.
//!
//! Every failure a request can hit is an [`AlphaError`]. Each variant maps to
//! a stable [`ErrorCode`], which in turn fixes the HTTP status and the
//! machine-readable reason string returned to clients.
//!
//! # HTTP Status Codes
//!
//! | Code | Status | Usage |
//! |------|--------|-------|
//! | `INVALID_INPUT` | 400 | Malformed or out-of-range request values |
//! | `INVALID_NUMBER` | 400 | A value could not be read as a decimal |
//! | `INVALID_IDENTIFIER` | 400 | Empty token identifier |
//! | `SYMBOL_RESOLUTION` | 400 | Identifier did not resolve to a symbol |
//! | `NO_TRADES_AVAILABLE` | 400 | Upstream returned an empty trade list |
//! | `RATE_LIMITED` | 429 | Sliding window threshold reached |
//! | `UPSTREAM_REJECTED` | 502 | Exchange answered with a 4xx |
//! | `UPSTREAM_PAYLOAD` | 502 | Exchange payload could not be decoded |
//! | `UPSTREAM_UNAVAILABLE` | 503 | Retries exhausted |
//! | `INTERNAL_ERROR` | 500 | Anything else; detail is never exposed |

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes exposed to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Invalid request format or out-of-range values.
    InvalidInput,
    /// A numeric value could not be converted to a decimal.
    InvalidNumber,
    /// The token identifier was empty.
    InvalidIdentifier,
    /// The identifier could not be resolved to a tradable symbol.
    SymbolResolution,
    /// The exchange returned no trades to aggregate.
    NoTradesAvailable,
    /// The caller exceeded the rate limit.
    RateLimited,
    /// The exchange rejected the request (4xx).
    UpstreamRejected,
    /// The exchange payload was missing fields or undecodable.
    UpstreamPayload,
    /// The exchange stayed unreachable after all retries.
    UpstreamUnavailable,
    /// Internal server error.
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidInput
            | Self::InvalidNumber
            | Self::InvalidIdentifier
            | Self::SymbolResolution
            | Self::NoTradesAvailable => StatusCode::BAD_REQUEST,

            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            Self::UpstreamRejected | Self::UpstreamPayload => StatusCode::BAD_GATEWAY,
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the reason string sent in error bodies.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidNumber => "INVALID_NUMBER",
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::SymbolResolution => "SYMBOL_RESOLUTION",
            Self::NoTradesAvailable => "NO_TRADES_AVAILABLE",
            Self::RateLimited => "RATE_LIMITED",
            Self::UpstreamRejected => "UPSTREAM_REJECTED",
            Self::UpstreamPayload => "UPSTREAM_PAYLOAD",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the error detail may be shown to the client.
    #[must_use]
    pub const fn is_client_visible(&self) -> bool {
        !matches!(self, Self::InternalError)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Errors raised while serving a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlphaError {
    /// Client supplied an invalid value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A value could not be converted to a decimal.
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// The token identifier was empty after trimming.
    #[error("alphaId is required")]
    InvalidIdentifier,

    /// Resolution produced no usable symbol.
    #[error("unable to resolve symbol from alphaId '{0}'")]
    SymbolResolution(String),

    /// No trades to aggregate.
    #[error("no trades available for aggregation")]
    NoTradesAvailable,

    /// The exchange rejected the request with a client error.
    #[error("upstream rejected request with status {status}: {message}")]
    UpstreamRejected {
        /// HTTP status returned by the exchange.
        status: u16,
        /// Body or reason returned by the exchange.
        message: String,
    },

    /// The exchange payload did not have the expected shape.
    #[error("unexpected upstream payload: {0}")]
    UpstreamPayload(String),

    /// All retry attempts failed.
    #[error("upstream unavailable after {attempts} attempts: {message}")]
    UpstreamUnavailable {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// The last transport or server error observed.
        message: String,
    },

    /// Unexpected failure inside the service.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AlphaError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::InvalidNumber(_) => ErrorCode::InvalidNumber,
            Self::InvalidIdentifier => ErrorCode::InvalidIdentifier,
            Self::SymbolResolution(_) => ErrorCode::SymbolResolution,
            Self::NoTradesAvailable => ErrorCode::NoTradesAvailable,
            Self::UpstreamRejected { .. } => ErrorCode::UpstreamRejected,
            Self::UpstreamPayload(_) => ErrorCode::UpstreamPayload,
            Self::UpstreamUnavailable { .. } => ErrorCode::UpstreamUnavailable,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Message safe to return to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.code().is_client_visible() {
            self.to_string()
        } else {
            "Internal Server Error".to_string()
        }
    }
}
