//! Outbound HTTP client with retry logic.
//!
//! Transport failures (connect errors, timeouts) and 5xx responses are
//! retried with exponential backoff. Anything else, including 4xx, is
//! returned on the first attempt. The delay before attempt `i` (`i >= 2`)
//! is `base * factor^(i-2)`.

use std::time::Duration;

use reqwest::{Client, Method, Proxy, Response, StatusCode};
use serde_json::Value;

use crate::error::AlphaError;
use crate::infrastructure::config::{ProxySettings, RetrySettings};
use crate::infrastructure::metrics::{self, RetryReason};

/// Longest upstream error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// HTTP client for exchange endpoints with retry logic.
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: Client,
    retry: RetrySettings,
}

impl RetryingHttpClient {
    /// Create a client from retry and proxy settings.
    ///
    /// # Errors
    ///
    /// Returns [`AlphaError::Internal`] if the proxy URL is invalid or the
    /// TLS backend cannot be initialized.
    pub fn new(retry: RetrySettings, proxy: &ProxySettings) -> Result<Self, AlphaError> {
        let mut builder = Client::builder().timeout(retry.timeout);

        // Proxy environment variables are ignored unless USE_PROXY is set.
        if let Some(url) = proxy.proxy_url() {
            let proxy = Proxy::all(&url)
                .map_err(|e| AlphaError::Internal(format!("invalid proxy {url}: {e}")))?;
            builder = builder.proxy(proxy);
            tracing::info!(proxy = %url, "Routing outbound requests through proxy");
        } else {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| AlphaError::Internal(format!("http client: {e}")))?;

        Ok(Self { client, retry })
    }

    /// Send a request, retrying transport failures and 5xx responses.
    ///
    /// Non-5xx responses are returned as-is, whatever their status.
    ///
    /// # Errors
    ///
    /// Returns [`AlphaError::UpstreamUnavailable`] once all attempts fail.
    pub async fn request_with_retries(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Response, AlphaError> {
        let mut backoff = ExponentialBackoff::new(&self.retry);

        loop {
            let (reason, last_error) = match self
                .client
                .request(method.clone(), url)
                .query(params)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_server_error() => {
                    (RetryReason::ServerError, format!("server error {}", resp.status()))
                }
                Ok(resp) => return Ok(resp),
                Err(e) => (RetryReason::Transport, e.to_string()),
            };

            if let Some(delay) = backoff.next_backoff() {
                tracing::warn!(
                    error = %last_error,
                    delay_ms = delay.as_millis(),
                    attempt = backoff.attempt,
                    "Upstream request failed, retrying"
                );
                metrics::record_upstream_retry(reason);
                tokio::time::sleep(delay).await;
                continue;
            }

            tracing::error!(
                attempts = backoff.attempt,
                method = %method,
                url = %url,
                error = %last_error,
                "HTTP failed after all attempts"
            );
            metrics::record_upstream_exhausted();
            return Err(AlphaError::UpstreamUnavailable {
                attempts: backoff.attempt,
                message: last_error,
            });
        }
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// # Errors
    ///
    /// - [`AlphaError::UpstreamUnavailable`] once retries are exhausted
    /// - [`AlphaError::UpstreamRejected`] for a non-success status
    /// - [`AlphaError::UpstreamPayload`] if the body is not JSON
    pub async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, AlphaError> {
        let response = self.request_with_retries(Method::GET, url, params).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejected(status, &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AlphaError::UpstreamPayload(e.to_string()))
    }
}

fn rejected(status: StatusCode, body: &str) -> AlphaError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string()
    } else {
        body.chars().take(MAX_ERROR_BODY_CHARS).collect()
    };
    AlphaError::UpstreamRejected {
        status: status.as_u16(),
        message,
    }
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetrySettings) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.backoff_base,
            multiplier: config.backoff_factor,
        }
    }

    /// Record a failed attempt and return the delay before the next one.
    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff =
            Duration::try_from_secs_f64(self.current_backoff.as_secs_f64() * self.multiplier)
                .unwrap_or(self.current_backoff);

        Some(backoff)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_retry(max_attempts: u32) -> RetrySettings {
        RetrySettings {
            max_attempts,
            backoff_base: Duration::from_millis(1),
            backoff_factor: 2.0,
            timeout: Duration::from_secs(2),
        }
    }

    fn client(max_attempts: u32) -> RetryingHttpClient {
        RetryingHttpClient::new(fast_retry(max_attempts), &ProxySettings::default()).unwrap()
    }

    #[test]
    fn backoff_grows_geometrically() {
        let settings = RetrySettings {
            max_attempts: 4,
            backoff_base: Duration::from_millis(250),
            backoff_factor: 2.0,
            timeout: Duration::from_secs(10),
        };
        let mut backoff = ExponentialBackoff::new(&settings);

        // Delays before attempts 2, 3 and 4.
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(250)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(500)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(1000)));
        assert_eq!(backoff.next_backoff(), None);
        assert_eq!(backoff.attempt, 4);
    }

    #[test]
    fn single_attempt_never_backs_off() {
        let mut backoff = ExponentialBackoff::new(&fast_retry(1));
        assert_eq!(backoff.next_backoff(), None);
        assert_eq!(backoff.attempt, 1);
    }

    #[test]
    fn invalid_proxy_is_rejected() {
        let proxy = ProxySettings {
            enabled: true,
            http_proxy: "http://[::1".to_string(),
            ..ProxySettings::default()
        };
        assert!(matches!(
            RetryingHttpClient::new(fast_retry(1), &proxy),
            Err(AlphaError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let value = client(3)
            .get_json(&format!("{}/data", server.uri()), &[])
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn exhausted_retries_report_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(3)
            .get_json(&format!("{}/data", server.uri()), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AlphaError::UpstreamUnavailable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("unknown symbol"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(3)
            .get_json(&format!("{}/data", server.uri()), &[])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AlphaError::UpstreamRejected {
                status: 404,
                message: "unknown symbol".to_string()
            }
        );
    }

    #[tokio::test]
    async fn query_parameters_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("symbol", "KOGEUSDT"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let params = [("symbol", "KOGEUSDT".to_string()), ("limit", "50".to_string())];
        client(1).get_json(&server.uri(), &params).await.unwrap();
    }

    #[tokio::test]
    async fn non_json_body_is_a_payload_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(1).get_json(&server.uri(), &[]).await.unwrap_err();
        assert!(matches!(err, AlphaError::UpstreamPayload(_)));
    }

    #[tokio::test]
    async fn connection_failures_are_retried_then_reported() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(2)
            .request_with_retries(Method::GET, &format!("http://{addr}/"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AlphaError::UpstreamUnavailable { attempts: 2, .. }));
    }
}
