//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the application services.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::ports::{TokenSourcePort, TradeFeedPort};
use crate::application::services::{PriceService, TokenListService};
use crate::domain::diff_range::compute_diff_range;
use crate::domain::precision::Precision;
use crate::domain::token::TokenEntry;
use crate::infrastructure::metrics as app_metrics;
use crate::infrastructure::rate_limit::SlidingWindowRateLimiter;

use super::middleware::{rate_limit, request_context};
use super::request::{PriceQuery, PriceRangeRequest};
use super::response::{ApiError, HealthResponse, PriceRangeResponse, PriceResponse};

/// Application state shared across handlers.
pub struct AppState<F, S>
where
    F: TradeFeedPort,
    S: TokenSourcePort,
{
    /// Price snapshot service.
    pub prices: Arc<PriceService<F>>,
    /// Token catalog service.
    pub tokens: Arc<TokenListService<S>>,
    /// Output precision for the calculator.
    pub precision: Precision,
    /// Shared rate limiter.
    pub limiter: Arc<SlidingWindowRateLimiter>,
    /// Prometheus handle; `/metrics` answers 503 without one.
    pub metrics: Option<PrometheusHandle>,
}

impl<F, S> Clone for AppState<F, S>
where
    F: TradeFeedPort,
    S: TokenSourcePort,
{
    fn clone(&self) -> Self {
        Self {
            prices: Arc::clone(&self.prices),
            tokens: Arc::clone(&self.tokens),
            precision: self.precision,
            limiter: Arc::clone(&self.limiter),
            metrics: self.metrics.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints and middleware.
pub fn create_router<F, S>(state: AppState<F, S>) -> Router
where
    F: TradeFeedPort + 'static,
    S: TokenSourcePort + 'static,
{
    let limiter = Arc::clone(&state.limiter);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics::<F, S>))
        .route("/api/alpha/tokens", get(list_tokens::<F, S>))
        .route("/api/alpha/price", get(get_price::<F, S>))
        .route("/api/calc/price-range", post(price_range::<F, S>))
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(middleware::from_fn(request_context))
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Prometheus metrics endpoint.
async fn render_metrics<F, S>(State(state): State<AppState<F, S>>) -> Response
where
    F: TradeFeedPort,
    S: TokenSourcePort,
{
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized",
        )
            .into_response(),
    }
}

/// Token catalog endpoint. Never fails; degrades to fallback or empty.
async fn list_tokens<F, S>(State(state): State<AppState<F, S>>) -> Json<Vec<TokenEntry>>
where
    F: TradeFeedPort,
    S: TokenSourcePort,
{
    let outcome = state.tokens.fetch_tokens().await;
    if outcome.origin.is_degraded() {
        app_metrics::record_token_list_degraded(outcome.origin.as_str());
    }
    Json(outcome.entries)
}

/// Price snapshot endpoint.
async fn get_price<F, S>(
    State(state): State<AppState<F, S>>,
    query: Result<Query<PriceQuery>, QueryRejection>,
) -> Result<Json<PriceResponse>, ApiError>
where
    F: TradeFeedPort,
    S: TokenSourcePort,
{
    let Query(query) = query.map_err(|_| ApiError::invalid_input("alphaId is required"))?;
    let snapshot = state.prices.fetch_price(&query.alpha_id).await?;
    Ok(Json(snapshot.into()))
}

/// Diff-range calculator endpoint.
async fn price_range<F, S>(
    State(state): State<AppState<F, S>>,
    body: Result<Json<PriceRangeRequest>, JsonRejection>,
) -> Result<Json<PriceRangeResponse>, ApiError>
where
    F: TradeFeedPort,
    S: TokenSourcePort,
{
    let Json(request) = body.map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;
    let input = request.into_input()?;
    let range = compute_diff_range(&input, &state.precision)?;
    tracing::debug!(
        fee_usdt = %range.fee_usdt,
        diff_lower = %range.lower,
        diff_upper = %range.upper,
        "Computed price range"
    );
    Ok(Json(range.into()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::application::services::TokenSource;
    use crate::domain::pricing::Trade;
    use crate::domain::symbol::SymbolResolver;
    use crate::error::AlphaError;

    // Mock trade feed
    struct MockFeed;

    #[async_trait]
    impl TradeFeedPort for MockFeed {
        async fn recent_trades(&self, symbol: &str, _limit: u32) -> Result<Vec<Trade>, AlphaError> {
            match symbol {
                "KOGEUSDT" => Ok(vec![
                    Trade::new(dec!(1.0), dec!(2.0), 1),
                    Trade::new(dec!(2.0), dec!(1.0), 2),
                    Trade::new(dec!(1.5), dec!(3.0), 3),
                ]),
                "EMPTYUSDT" => Ok(Vec::new()),
                "DOWNUSDT" => Err(AlphaError::UpstreamUnavailable {
                    attempts: 3,
                    message: "connect timeout".to_string(),
                }),
                "BOOMUSDT" => panic!("feed exploded"),
                _ => Err(AlphaError::UpstreamPayload("unknown symbol".to_string())),
            }
        }
    }

    // Mock token source
    struct MockTokens;

    #[async_trait]
    impl TokenSourcePort for MockTokens {
        async fn fetch_token_list(&self, _url: &str) -> Result<Value, AlphaError> {
            Ok(json!({"data": [{"alphaId": "ALPHA_118", "symbol": "KOGE"}]}))
        }
    }

    fn test_router(limit: u32) -> Router {
        let precision = Precision::default();
        let resolver = Arc::new(SymbolResolver::default());
        let state = AppState {
            prices: Arc::new(PriceService::new(Arc::new(MockFeed), resolver, precision, 50)),
            tokens: Arc::new(TokenListService::new(
                Arc::new(MockTokens),
                TokenSource::parse("https://tokens.test/list"),
                PathBuf::from("/nonexistent.json"),
            )),
            precision,
            limiter: Arc::new(SlidingWindowRateLimiter::new(Duration::from_secs(60), limit)),
            metrics: None,
        };
        create_router(state)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = test_router(10).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn price_endpoint() {
        let response = test_router(10)
            .oneshot(get("/api/alpha/price?alphaId=koge"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["symbol"], "KOGEUSDT");
        assert_eq!(body["price_now"], "1.50000000");
        assert_eq!(body["price_avg"], "1.50000000");
        assert_eq!(body["price_vwap"], "1.41666667");
        assert!(body["timestamp"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn missing_alpha_id_is_bad_request() {
        let response = test_router(10)
            .oneshot(get("/api/alpha/price"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn blank_alpha_id_is_bad_request() {
        let response = test_router(10)
            .oneshot(get("/api/alpha/price?alphaId=%20"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_IDENTIFIER");
    }

    #[tokio::test]
    async fn empty_trade_window_is_bad_request() {
        let response = test_router(10)
            .oneshot(get("/api/alpha/price?alphaId=EMPTY"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "NO_TRADES_AVAILABLE");
    }

    #[tokio::test]
    async fn exhausted_upstream_is_service_unavailable() {
        let response = test_router(10)
            .oneshot(get("/api/alpha/price?alphaId=DOWN"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["code"], "UPSTREAM_UNAVAILABLE");
    }

    #[tokio::test]
    async fn handler_panic_becomes_generic_500() {
        let response = test_router(10)
            .oneshot(get("/api/alpha/price?alphaId=BOOM"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            body_json(response).await,
            json!({"code": "INTERNAL_ERROR", "message": "Internal Server Error"})
        );
    }

    #[tokio::test]
    async fn tokens_endpoint() {
        let response = test_router(10)
            .oneshot(get("/api/alpha/tokens"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!([{"alphaId": "ALPHA_118", "symbol": "KOGE"}])
        );
    }

    #[tokio::test]
    async fn price_range_reference_scenario() {
        let response = test_router(10)
            .oneshot(post_json(
                "/api/calc/price-range",
                &json!({
                    "price_now": 1,
                    "per_volume": 100,
                    "waste_lower": 3,
                    "waste_upper": 5,
                    "fee_amount_token": 2
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"diff_lower": "0.01000000", "diff_upper": "0.03000000"})
        );
    }

    #[tokio::test]
    async fn price_range_rejects_zero_price() {
        let response = test_router(10)
            .oneshot(post_json(
                "/api/calc/price-range",
                &json!({
                    "price_now": 0,
                    "per_volume": 100,
                    "waste_lower": 3,
                    "waste_upper": 5,
                    "fee_amount_token": 2
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn price_range_rejects_malformed_body() {
        let response = test_router(10)
            .oneshot(post_json("/api/calc/price-range", &json!({"price_now": 1})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = test_router(10).oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn rate_limit_headers_and_throttling() {
        let router = test_router(2);

        let first = router.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(first.headers()["x-ratelimit-limit"], "2");
        assert_eq!(first.headers()["x-ratelimit-remaining"], "1");

        let second = router.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(second.headers()["x-ratelimit-remaining"], "0");

        let third = router.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(third.headers()["retry-after"], "60");
        assert_eq!(third.headers()["x-ratelimit-remaining"], "0");
        assert!(third.headers().contains_key("x-request-id"));
        assert_eq!(body_json(third).await["code"], "RATE_LIMITED");

        // Other paths have their own bucket.
        let other = router.oneshot(get("/api/alpha/tokens")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_unavailable() {
        let response = test_router(10).oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
