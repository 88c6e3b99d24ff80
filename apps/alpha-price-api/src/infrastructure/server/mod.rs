//! API Server
//!
//! Wires configuration into adapters and services, and runs the axum
//! server until cancelled.
//!
//! # Endpoints
//!
//! - `GET /health` - Liveness, always `{"status":"ok"}`
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /api/alpha/tokens` - Token catalog
//! - `GET /api/alpha/price?alphaId=` - Price snapshot
//! - `POST /api/calc/price-range` - Diff-range calculator

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::{PriceService, TokenListService, TokenSource, read_token_file};
use crate::domain::symbol::SymbolResolver;
use crate::error::AlphaError;
use crate::infrastructure::binance::BinanceAlphaAdapter;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http::{AppState, create_router};
use crate::infrastructure::http_client::RetryingHttpClient;
use crate::infrastructure::rate_limit::SlidingWindowRateLimiter;

/// Application state backed by the Binance adapter.
pub type BinanceAppState = AppState<BinanceAlphaAdapter, BinanceAlphaAdapter>;

/// Build the production application state from configuration.
///
/// The local token file seeds the symbol lookup table; a missing or
/// unreadable file leaves the table empty.
///
/// # Errors
///
/// Returns [`AlphaError::Internal`] if the HTTP client cannot be built.
pub async fn build_app_state(
    config: &AppConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<BinanceAppState, AlphaError> {
    let client = RetryingHttpClient::new(config.retry, &config.proxy)?;
    let adapter = Arc::new(BinanceAlphaAdapter::new(client, &config.upstream.rest_base));

    let lookup = match read_token_file(&config.upstream.tokens_file).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Symbol lookup table unavailable, using suffix rules only");
            Vec::new()
        }
    };
    let resolver =
        SymbolResolver::new(&config.upstream.symbol_suffix).with_entries(&lookup);
    tracing::info!(
        entries = resolver.table_len(),
        suffix = resolver.suffix(),
        "Symbol resolver ready"
    );

    let precision = config.output.precision();

    Ok(AppState {
        prices: Arc::new(PriceService::new(
            Arc::clone(&adapter),
            Arc::new(resolver),
            precision,
            config.upstream.trades_limit,
        )),
        tokens: Arc::new(TokenListService::new(
            adapter,
            TokenSource::parse(&config.upstream.tokens_api),
            config.upstream.tokens_file.clone(),
        )),
        precision,
        limiter: Arc::new(SlidingWindowRateLimiter::from_settings(&config.rate_limit)),
        metrics,
    })
}

/// HTTP API server.
pub struct ApiServer {
    bind_address: String,
    router: Router,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a server for a router.
    #[must_use]
    pub const fn new(bind_address: String, router: Router, cancel: CancellationToken) -> Self {
        Self {
            bind_address,
            router,
            cancel,
        }
    }

    /// Create a server from application state.
    #[must_use]
    pub fn from_state(bind_address: String, state: BinanceAppState, cancel: CancellationToken) -> Self {
        Self::new(bind_address, create_router(state), cancel)
    }

    /// Bind and run until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .map_err(|e| ServerError::BindFailed(self.bind_address.clone(), e.to_string()))?;
        self.run_with_listener(listener).await
    }

    /// Run on an already bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the HTTP server fails while running.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local = listener
            .local_addr()
            .map_or_else(|_| self.bind_address.clone(), |a| a.to_string());
        tracing::info!(addr = %local, "API server listening");

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(self.cancel.cancelled_owned())
        .await
        .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(String, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
