//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, and the HTTP surface in front of them.

/// Binance alpha REST adapter (token list, aggregate trades).
pub mod binance;

/// Configuration from environment variables.
pub mod config;

/// HTTP API: routes, middleware, request and response types.
pub mod http;

/// Outbound HTTP client with retries.
pub mod http_client;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Sliding window rate limiting.
pub mod rate_limit;

/// Application wiring and the API server.
pub mod server;

/// OpenTelemetry tracing integration.
pub mod telemetry;
