//! Configuration Module
//!
//! Environment-driven settings for the HTTP server, outbound client,
//! rate limiter and exchange endpoints.

mod settings;

pub use settings::{
    AppConfig, ConfigError, OutputSettings, ProxySettings, RateLimitSettings, RetrySettings,
    ServerSettings, UpstreamSettings,
};
