//! Alpha Price API Binary
//!
//! Starts the HTTP price proxy.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin alpha-price-api
//! ```
//!
//! # Environment Variables
//!
//! All optional.
//!
//! - `HTTP_HOST` / `HTTP_PORT`: Bind address (default: 0.0.0.0:8000)
//! - `BINANCE_REST_BASE`: Exchange REST base URL
//! - `ALPHA_TOKENS_API`: Remote token list URL or local path; empty disables
//! - `ALPHA_TOKENS_FILE`: Local token list (default: data/alpha_tokens.json)
//! - `ALPHA_SYMBOL_SUFFIX`: Quote suffix (default: USDT)
//! - `DEFAULT_TRADES_LIMIT`: Trades per price window (default: 50)
//! - `DECIMAL_PLACES` / `ROUNDING_MODE`: Output precision (default: 8, HALF_UP)
//! - `USE_PROXY`, `HTTP_PROXY`, `SOCKS_HOST`, `SOCKS_PORT`: Outbound proxy
//! - `RATE_LIMIT_WINDOW_SECONDS` / `RATE_LIMIT_MAX_REQUESTS`: Inbound limits
//! - `RATE_LIMIT_SWEEP_INTERVAL_SECONDS`: Idle key sweep (default: 300)
//! - `RETRY_MAX_ATTEMPTS`, `RETRY_BACKOFF_BASE`, `RETRY_BACKOFF_FACTOR`,
//!   `HTTP_TIMEOUT_SECONDS`: Outbound retry policy
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: false)
//! - `RUST_LOG` / `LOG_LEVEL`: Log filter (default: info)

use std::sync::Arc;
use std::time::Duration;

use alpha_price_api::infrastructure::metrics::init_metrics;
use alpha_price_api::infrastructure::rate_limit::RateLimitSweeper;
use alpha_price_api::infrastructure::server::{ApiServer, build_app_state};
use alpha_price_api::infrastructure::telemetry;
use alpha_price_api::AppConfig;
use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init(&config.log_level);

    tracing::info!("Starting Alpha Price API");

    // Initialize Prometheus metrics
    let metrics_handle = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics recorder unavailable");
            None
        }
    };

    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let state = build_app_state(&config, metrics_handle)
        .await
        .context("failed to build application state")?;

    // Spawn rate limit sweeper
    let sweeper = RateLimitSweeper::new(
        Arc::clone(&state.limiter),
        config.rate_limit.sweep_interval,
        shutdown_token.clone(),
    );
    tokio::spawn(sweeper.run());

    // Spawn API server
    let server = ApiServer::from_state(
        config.server.bind_address(),
        state,
        shutdown_token.clone(),
    );
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            tracing::error!(error = %e, "API server error");
            return Err(e);
        }
        Ok(())
    });

    tracing::info!("Alpha Price API ready");

    tokio::select! {
        () = await_shutdown(shutdown_token.clone()) => {}
        result = server_task => {
            shutdown_token.cancel();
            result
                .context("API server task failed")?
                .context("API server stopped")?;
        }
    }

    tracing::info!("Alpha Price API stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &AppConfig) {
    tracing::info!(
        bind = %config.server.bind_address(),
        decimal_places = config.output.decimal_places,
        rounding = config.output.rounding.as_str(),
        rate_limit = config.rate_limit.max_requests,
        rate_window_secs = config.rate_limit.window.as_secs(),
        proxy = config.proxy.enabled,
        "Configuration loaded"
    );
    tracing::debug!(
        rest_base = %config.upstream.rest_base,
        tokens_api = %config.upstream.tokens_api,
        tokens_file = %config.upstream.tokens_file.display(),
        symbol_suffix = %config.upstream.symbol_suffix,
        trades_limit = config.upstream.trades_limit,
        max_attempts = config.retry.max_attempts,
        "Upstream endpoints"
    );
}

/// Load .env file from any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
