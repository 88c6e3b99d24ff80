//! Rate Limiting Integration Tests
//!
//! Tests per-client, per-path sliding windows through the HTTP stack and
//! the limiter under concurrent load.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use alpha_price_api::infrastructure::rate_limit::RateLimitSweeper;
use alpha_price_api::{
    AppConfig, RateKey, SlidingWindowRateLimiter, build_app_state, create_router, init_metrics,
};

async fn router(max_requests: u32, window: Duration) -> (Router, Arc<SlidingWindowRateLimiter>) {
    let mut config = AppConfig::default();
    config.upstream.tokens_file = "/nonexistent/alpha_tokens.json".into();
    config.upstream.tokens_api = String::new();
    config.rate_limit.max_requests = max_requests;
    config.rate_limit.window = window;

    let state = build_app_state(&config, None).await.unwrap();
    let limiter = Arc::clone(&state.limiter);
    (create_router(state), limiter)
}

async fn hit(router: &Router, uri: &str, client: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("x-forwarded-for", client)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

fn header<'a>(response: &'a Response, name: &str) -> &'a str {
    response.headers()[name].to_str().unwrap()
}

#[tokio::test]
async fn third_request_in_window_is_throttled() {
    let (router, _) = router(2, Duration::from_secs(60)).await;

    let first = hit(&router, "/health", "10.0.0.1").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-ratelimit-limit"), "2");
    assert_eq!(header(&first, "x-ratelimit-remaining"), "1");

    let second = hit(&router, "/health", "10.0.0.1").await;
    assert_eq!(header(&second, "x-ratelimit-remaining"), "0");

    let third = hit(&router, "/health", "10.0.0.1").await;
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&third, "retry-after"), "60");

    let body = axum::body::to_bytes(third.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn clients_and_paths_have_separate_windows() {
    let (router, limiter) = router(1, Duration::from_secs(60)).await;

    assert_eq!(hit(&router, "/health", "10.0.0.1").await.status(), StatusCode::OK);
    assert_eq!(
        hit(&router, "/health", "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // Another client on the same path.
    assert_eq!(hit(&router, "/health", "10.0.0.2").await.status(), StatusCode::OK);

    // Same client on another path.
    assert_eq!(
        hit(&router, "/api/alpha/tokens", "10.0.0.1").await.status(),
        StatusCode::OK
    );

    assert_eq!(limiter.tracked_keys(), 3);
}

#[tokio::test]
async fn first_forwarded_address_identifies_the_client() {
    let (router, _) = router(1, Duration::from_secs(60)).await;

    assert_eq!(
        hit(&router, "/health", "10.0.0.9, 172.16.0.1").await.status(),
        StatusCode::OK
    );
    assert_eq!(
        hit(&router, "/health", "10.0.0.9, 172.16.0.2").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn window_expiry_readmits_client() {
    let (router, _) = router(1, Duration::from_millis(100)).await;

    assert_eq!(hit(&router, "/health", "10.0.0.1").await.status(), StatusCode::OK);
    assert_eq!(
        hit(&router, "/health", "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(hit(&router, "/health", "10.0.0.1").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn throttled_requests_are_not_counted() {
    let (router, _) = router(1, Duration::from_millis(100)).await;

    assert_eq!(hit(&router, "/health", "10.0.0.1").await.status(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(70)).await;
    assert_eq!(
        hit(&router, "/health", "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // Only the first request occupies the window.
    tokio::time::sleep(Duration::from_millis(70)).await;
    assert_eq!(hit(&router, "/health", "10.0.0.1").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn throttled_unknown_paths_share_one_metric_label() {
    let handle = init_metrics().unwrap();
    let (router, _) = router(1, Duration::from_secs(60)).await;

    for path in ["/scan/a1b2c3", "/scan/d4e5f6"] {
        assert_eq!(hit(&router, path, "10.9.9.9").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            hit(&router, path, "10.9.9.9").await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    let rendered = handle.render();
    assert!(rendered.contains(r#"alpha_api_rate_limited_total{route="unmatched"}"#));
    assert!(!rendered.contains("a1b2c3"));
    assert!(!rendered.contains("d4e5f6"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_never_exceed_limit() {
    let limiter = Arc::new(SlidingWindowRateLimiter::new(Duration::from_secs(60), 10));
    let key = RateKey::new("10.0.0.1", "/api/alpha/price");

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let key = key.clone();
            tokio::spawn(async move { limiter.check(&key).is_allowed() })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }

    assert_eq!(allowed, 10);
}

#[tokio::test]
async fn sweeper_drops_idle_keys() {
    let limiter = Arc::new(SlidingWindowRateLimiter::new(Duration::from_millis(20), 5));
    limiter.check(&RateKey::new("10.0.0.1", "/health"));
    limiter.check(&RateKey::new("10.0.0.2", "/health"));
    assert_eq!(limiter.tracked_keys(), 2);

    let cancel = CancellationToken::new();
    let sweeper = RateLimitSweeper::new(
        Arc::clone(&limiter),
        Duration::from_millis(30),
        cancel.clone(),
    );
    let task = tokio::spawn(sweeper.run());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(limiter.tracked_keys(), 0);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
}
