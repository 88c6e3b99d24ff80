//! HTTP response DTOs and error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::diff_range::DiffRange;
use crate::domain::pricing::PriceSnapshot;
use crate::error::{AlphaError, ErrorCode};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
}

/// Price snapshot response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    /// Pair symbol.
    pub symbol: String,
    /// Last traded price.
    pub price_now: Decimal,
    /// Mean trade price.
    pub price_avg: Decimal,
    /// Volume-weighted average price.
    pub price_vwap: Decimal,
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
}

impl From<PriceSnapshot> for PriceResponse {
    fn from(snapshot: PriceSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol,
            price_now: snapshot.last,
            price_avg: snapshot.average,
            price_vwap: snapshot.vwap,
            timestamp: snapshot.timestamp_ms,
        }
    }
}

/// Diff-range calculator response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRangeResponse {
    /// Lower price difference.
    pub diff_lower: Decimal,
    /// Upper price difference.
    pub diff_upper: Decimal,
}

impl From<DiffRange> for PriceRangeResponse {
    fn from(range: DiffRange) -> Self {
        Self {
            diff_lower: range.lower,
            diff_upper: range.upper,
        }
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// An error ready to be rendered as an HTTP response.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Create an error with an explicit code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.http_status(),
            body: ErrorResponse {
                code,
                message: message.into(),
            },
        }
    }

    /// Malformed request.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Rate limit exceeded.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self::new(ErrorCode::RateLimited, "Too Many Requests")
    }

    /// Unexpected failure; detail is never exposed.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Internal Server Error")
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Error code of this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.body.code
    }
}

impl From<AlphaError> for ApiError {
    fn from(err: AlphaError) -> Self {
        let code = err.code();
        if code.is_client_visible() {
            if code.http_status().is_server_error() || code == ErrorCode::UpstreamRejected {
                tracing::warn!(error = %err, code = %code, "Upstream failure");
            }
        } else {
            tracing::error!(error = %err, "Internal error");
        }
        Self::new(code, err.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
