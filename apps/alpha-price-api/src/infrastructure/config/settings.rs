//! Application Configuration Settings
//!
//! Configuration types for the alpha price API, loaded from environment
//! variables. Missing or unparsable values fall back to defaults; values
//! that parse but make no sense are rejected with [`ConfigError`].

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::precision::{
    DEFAULT_DECIMAL_PLACES, MAX_DECIMAL_PLACES, Precision, RoundingMode,
};
use crate::domain::symbol::DEFAULT_QUOTE_SUFFIX;

/// Default Binance alpha token list endpoint.
const DEFAULT_TOKENS_API: &str =
    "https://www.binance.com/bapi/defi/v1/public/wallet-direct/buw/wallet/cex/alpha/all/token/list";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerSettings {
    /// `host:port` string suitable for binding.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Output quantization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    /// Fractional digits in response values.
    pub decimal_places: u32,
    /// Tie-breaking rule.
    pub rounding: RoundingMode,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            decimal_places: DEFAULT_DECIMAL_PLACES,
            rounding: RoundingMode::HalfUp,
        }
    }
}

impl OutputSettings {
    /// Precision policy for the domain.
    #[must_use]
    pub fn precision(&self) -> Precision {
        Precision::new(self.decimal_places, self.rounding)
    }
}

/// Outbound proxy settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// Route outbound calls through a proxy.
    pub enabled: bool,
    /// HTTP proxy URL; takes precedence over SOCKS.
    pub http_proxy: String,
    /// SOCKS5 proxy host.
    pub socks_host: String,
    /// SOCKS5 proxy port.
    pub socks_port: u16,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            http_proxy: String::new(),
            socks_host: "127.0.0.1".to_string(),
            socks_port: 33211,
        }
    }
}

impl ProxySettings {
    /// Effective proxy URL, if proxying is enabled.
    ///
    /// A bare `host:port` HTTP proxy gets an `http://` scheme.
    #[must_use]
    pub fn proxy_url(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let http_proxy = self.http_proxy.trim();
        if http_proxy.is_empty() {
            return Some(format!("socks5h://{}:{}", self.socks_host, self.socks_port));
        }
        if http_proxy.contains("://") {
            Some(http_proxy.to_string())
        } else {
            Some(format!("http://{http_proxy}"))
        }
    }
}

/// Sliding window rate limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Window length.
    pub window: Duration,
    /// Requests allowed per window per client and path.
    pub max_requests: u32,
    /// How often idle keys are swept.
    pub sweep_interval: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 60,
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Outbound retry settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySettings {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub backoff_base: Duration,
    /// Multiplier applied per further attempt.
    pub backoff_factor: f64,
    /// Per-attempt request timeout.
    pub timeout: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(250),
            backoff_factor: 2.0,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Exchange endpoints and token catalog locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    /// Exchange REST base URL.
    pub rest_base: String,
    /// Token list URL or file path. Empty disables the primary source.
    pub tokens_api: String,
    /// Local token file used as fallback and symbol lookup table.
    pub tokens_file: PathBuf,
    /// Quote suffix appended to base symbols.
    pub symbol_suffix: String,
    /// Trades fetched per price snapshot.
    pub trades_limit: u32,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            rest_base: "https://www.binance.com".to_string(),
            tokens_api: DEFAULT_TOKENS_API.to_string(),
            tokens_file: PathBuf::from("data/alpha_tokens.json"),
            symbol_suffix: DEFAULT_QUOTE_SUFFIX.to_string(),
            trades_limit: 50,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// HTTP listener.
    pub server: ServerSettings,
    /// Output quantization.
    pub output: OutputSettings,
    /// Outbound proxy.
    pub proxy: ProxySettings,
    /// Rate limiting.
    pub rate_limit: RateLimitSettings,
    /// Outbound retries.
    pub retry: RetrySettings,
    /// Exchange endpoints.
    pub upstream: UpstreamSettings,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            output: OutputSettings::default(),
            proxy: ProxySettings::default(),
            rate_limit: RateLimitSettings::default(),
            retry: RetrySettings::default(),
            upstream: UpstreamSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a semantically invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a semantically invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);
        let defaults = Self::default();

        let server = ServerSettings {
            host: env.string("HTTP_HOST", &defaults.server.host),
            port: env.parse("HTTP_PORT", defaults.server.port),
        };

        let decimal_places = env.parse("DECIMAL_PLACES", defaults.output.decimal_places);
        if decimal_places > MAX_DECIMAL_PLACES {
            return Err(ConfigError::InvalidValue {
                key: "DECIMAL_PLACES".to_string(),
                reason: format!("must be at most {MAX_DECIMAL_PLACES}"),
            });
        }
        let rounding = match env.get("ROUNDING_MODE") {
            Some(raw) => RoundingMode::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "ROUNDING_MODE".to_string(),
                reason: format!("unknown rounding mode '{raw}'"),
            })?,
            None => defaults.output.rounding,
        };
        let output = OutputSettings {
            decimal_places,
            rounding,
        };

        let proxy = ProxySettings {
            enabled: env.flag("USE_PROXY", defaults.proxy.enabled),
            http_proxy: env.string("HTTP_PROXY", &defaults.proxy.http_proxy),
            socks_host: env.string("SOCKS_HOST", &defaults.proxy.socks_host),
            socks_port: env.parse("SOCKS_PORT", defaults.proxy.socks_port),
        };

        let rate_limit = RateLimitSettings {
            window: env.duration_secs("RATE_LIMIT_WINDOW_SECONDS", defaults.rate_limit.window),
            max_requests: env.parse("RATE_LIMIT_MAX_REQUESTS", defaults.rate_limit.max_requests),
            sweep_interval: env.duration_secs(
                "RATE_LIMIT_SWEEP_INTERVAL_SECONDS",
                defaults.rate_limit.sweep_interval,
            ),
        };
        if rate_limit.max_requests == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_MAX_REQUESTS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if rate_limit.window.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_WINDOW_SECONDS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if rate_limit.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_SWEEP_INTERVAL_SECONDS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let retry = RetrySettings {
            max_attempts: env.parse("RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts),
            backoff_base: env
                .fractional_secs("RETRY_BACKOFF_BASE", defaults.retry.backoff_base),
            backoff_factor: env.parse("RETRY_BACKOFF_FACTOR", defaults.retry.backoff_factor),
            timeout: env.fractional_secs("HTTP_TIMEOUT_SECONDS", defaults.retry.timeout),
        };
        if retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RETRY_MAX_ATTEMPTS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !retry.backoff_factor.is_finite() || retry.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "RETRY_BACKOFF_FACTOR".to_string(),
                reason: "must be a finite number >= 1".to_string(),
            });
        }

        let upstream = UpstreamSettings {
            rest_base: env
                .string("BINANCE_REST_BASE", &defaults.upstream.rest_base)
                .trim_end_matches('/')
                .to_string(),
            // An explicitly empty value disables the remote catalog.
            tokens_api: env
                .get_raw("ALPHA_TOKENS_API")
                .unwrap_or(defaults.upstream.tokens_api),
            tokens_file: env
                .get("ALPHA_TOKENS_FILE")
                .map_or(defaults.upstream.tokens_file, PathBuf::from),
            symbol_suffix: env.string("ALPHA_SYMBOL_SUFFIX", &defaults.upstream.symbol_suffix),
            trades_limit: env.parse("DEFAULT_TRADES_LIMIT", defaults.upstream.trades_limit),
        };

        Ok(Self {
            server,
            output,
            proxy,
            rate_limit,
            retry,
            upstream,
            log_level: env.string("LOG_LEVEL", &defaults.log_level),
        })
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be used.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Typed access to a key lookup.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Trimmed, non-empty value.
    fn get(&self, key: &str) -> Option<String> {
        self.0(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed value, possibly empty.
    fn get_raw(&self, key: &str) -> Option<String> {
        self.0(key).map(|v| v.trim().to_string())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key).map_or(default, |v| {
            matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
        })
    }

    fn duration_secs(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(default, Duration::from_secs)
    }

    fn fractional_secs(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(default)
    }
}
