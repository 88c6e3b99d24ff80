//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Requests**: Counts and latencies of served HTTP requests
//! - **Rate Limiting**: Requests rejected by the sliding window limiter
//! - **Upstream**: Retries and exhausted retry budgets against the exchange
//! - **Token List**: Catalog loads that fell back to the local file
//!
//! # Integration
//!
//! Metrics are rendered at `GET /metrics` on the API port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "alpha_api_http_requests_total",
        "Total HTTP requests served by route and status"
    );
    describe_histogram!(
        "alpha_api_http_request_duration_seconds",
        "HTTP request handling time by route"
    );

    describe_counter!(
        "alpha_api_rate_limited_total",
        "Requests rejected by the rate limiter"
    );

    describe_counter!(
        "alpha_api_upstream_retries_total",
        "Outbound requests retried after a transient failure"
    );
    describe_counter!(
        "alpha_api_upstream_exhausted_total",
        "Outbound requests that failed after all attempts"
    );

    describe_counter!(
        "alpha_api_token_list_degraded_total",
        "Token list loads served from fallback or empty"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Why an outbound request was retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// Connection failure or timeout.
    Transport,
    /// The exchange answered with a 5xx.
    ServerError,
}

impl RetryReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::ServerError => "server_error",
        }
    }
}

/// Record a served HTTP request.
pub fn record_request(route: &str, status: u16, duration: Duration) {
    counter!(
        "alpha_api_http_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "alpha_api_http_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limited(route: &str) {
    counter!(
        "alpha_api_rate_limited_total",
        "route" => route.to_string()
    )
    .increment(1);
}

/// Record an outbound retry.
pub fn record_upstream_retry(reason: RetryReason) {
    counter!(
        "alpha_api_upstream_retries_total",
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record an outbound request that exhausted its attempts.
pub fn record_upstream_exhausted() {
    counter!("alpha_api_upstream_exhausted_total").increment(1);
}

/// Record a token list load that did not come from the primary source.
pub fn record_token_list_degraded(origin: &'static str) {
    counter!(
        "alpha_api_token_list_degraded_total",
        "origin" => origin
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
