//! Request middleware.
//!
//! - `request_context`: request id, access log, metrics, panic boundary
//! - `rate_limit`: sliding window limit per (client, path)

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::{HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::infrastructure::metrics;
use crate::infrastructure::rate_limit::{RateDecision, RateKey, SlidingWindowRateLimiter};

use super::response::ApiError;

/// Request correlation header.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Requests allowed per window.
pub const RATE_LIMIT_LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");

/// Requests left in the current window.
pub const RATE_LIMIT_REMAINING_HEADER: HeaderName =
    HeaderName::from_static("x-ratelimit-remaining");

const FORWARDED_FOR_HEADER: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Outermost middleware: assigns the request id, logs the request, records
/// metrics, and turns handler panics into a generic 500.
pub async fn request_context(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty())
        .cloned()
        .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let span = tracing::info_span!(
        "request",
        request_id = request_id
            .as_ref()
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-"),
        method = %method,
        path = %path,
    );

    let start = Instant::now();
    let mut response = AssertUnwindSafe(next.run(request).instrument(span.clone()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            tracing::error!(
                parent: &span,
                panic = %panic_message(panic.as_ref()),
                "Unhandled panic in request handler"
            );
            ApiError::internal().into_response()
        });
    let elapsed = start.elapsed();

    let status = response.status();
    tracing::info!(
        parent: &span,
        status = status.as_u16(),
        duration_ms = elapsed.as_secs_f64() * 1000.0,
        "{method} {path} -> {}",
        status.as_u16()
    );
    metrics::record_request(&route, status.as_u16(), elapsed);

    if let Some(id) = request_id {
        response.headers_mut().entry(REQUEST_ID_HEADER).or_insert(id);
    }
    response
}

/// Matched route template for metric labels, `unmatched` when no route
/// matched. Keeps label cardinality bounded.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Sliding window rate limit per (client, path).
pub async fn rate_limit(
    State(limiter): State<Arc<SlidingWindowRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_identifier(&request);
    let path = request.uri().path().to_string();
    let limit = HeaderValue::from(limiter.limit());

    match limiter.check(&RateKey::new(client.clone(), path.clone())) {
        RateDecision::Throttled { retry_after } => {
            tracing::warn!(client = %client, path = %path, "Rate limit exceeded");
            metrics::record_rate_limited(&route_label(&request));

            let mut response = ApiError::rate_limited().into_response();
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after.as_secs()));
            headers.insert(RATE_LIMIT_LIMIT_HEADER, limit);
            headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(0_u32));
            response
        }
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.entry(RATE_LIMIT_LIMIT_HEADER).or_insert(limit);
            headers
                .entry(RATE_LIMIT_REMAINING_HEADER)
                .or_insert_with(|| HeaderValue::from(remaining));
            response
        }
    }
}

/// Client identifier: first `X-Forwarded-For` entry, else peer IP, else `-`.
#[must_use]
pub fn client_identifier(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get(&FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(client) = forwarded {
        return client.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}
