//! HTTP utilities for connectors.
//!
//! `HttpClient` wraps a single outbound call with bounded retry on transient
//! failure (transport errors and HTTP 429) and an optional client-side rate
//! limit. Every other response is handed back to the caller on the attempt
//! that produced it: interpreting 4xx/5xx is the caller's job.

use crate::traits::{AuthConfig, ConnectorConfig, ConnectorError, ConnectorResult};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Type alias for the rate limiter.
type RateLimiterType = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default number of attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(20);

/// Bounded, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first. Never less than one.
    pub max_attempts: u32,
    /// Delay slept between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Builds the policy described by a connector configuration.
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per period.
    pub max_requests: u32,
    /// Period duration.
    pub period: Duration,
    /// Maximum burst size.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 120,
            period: Duration::from_secs(60),
            burst_size: 10,
        }
    }
}

/// HTTP client with retry and rate limiting support.
pub struct HttpClient {
    client: Client,
    config: ConnectorConfig,
    retry: RetryPolicy,
    rate_limiter: Option<Arc<RateLimiterType>>,
}

impl HttpClient {
    /// Creates a new HTTP client from connector configuration.
    pub fn new(config: ConnectorConfig) -> ConnectorResult<Self> {
        Self::with_rate_limit(config, None)
    }

    /// Creates a new HTTP client with client-side rate limiting.
    pub fn with_rate_limit(
        config: ConnectorConfig,
        rate_limit: Option<RateLimitConfig>,
    ) -> ConnectorResult<Self> {
        // TLS verification can only be turned off in debug builds.
        let verify_tls = if !config.verify_tls {
            #[cfg(debug_assertions)]
            {
                warn!(
                    base_url = %config.base_url,
                    connector_name = %config.name,
                    "TLS certificate verification DISABLED in development mode"
                );
                false
            }
            #[cfg(not(debug_assertions))]
            {
                warn!(
                    base_url = %config.base_url,
                    connector_name = %config.name,
                    "Attempted to disable TLS verification in a release build - request IGNORED"
                );
                true
            }
        } else {
            true
        };

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::try_from(key.as_str()),
                reqwest::header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, val);
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!verify_tls)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(headers)
            .build()
            .map_err(|e| ConnectorError::ConfigError(e.to_string()))?;

        let rate_limiter = match rate_limit {
            Some(rl) => {
                let quota = Quota::with_period(rl.period / rl.max_requests.max(1))
                    .ok_or_else(|| {
                        ConnectorError::ConfigError("Invalid rate limit period".to_string())
                    })?
                    .allow_burst(NonZeroU32::new(rl.burst_size).unwrap_or(NonZeroU32::MIN));
                Some(Arc::new(GovernorRateLimiter::direct(quota)))
            }
            None => None,
        };

        let retry = RetryPolicy::from_config(&config);

        Ok(Self {
            client,
            config,
            retry,
            rate_limiter,
        })
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            delay: retry.delay,
        };
        self
    }

    /// Returns the active retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Builds a URL from a path.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Executes a GET request.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ConnectorResult<Response> {
        self.execute(Method::GET, path, query, None).await
    }

    /// Executes a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> ConnectorResult<Response> {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    /// Executes a PATCH request with a JSON body.
    pub async fn patch(&self, path: &str, body: &Value) -> ConnectorResult<Response> {
        self.execute(Method::PATCH, path, &[], Some(body)).await
    }

    /// Executes one logical call, retrying on 429 and transport failures.
    ///
    /// Returns the first response that is not a 429, whatever its status.
    /// After `max_attempts` retryable failures, returns
    /// [`ConnectorError::RetriesExhausted`]; the caller must then treat the
    /// remote state as unknown.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ConnectorResult<Response> {
        let url = self.build_url(path);
        let mut request = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = self.add_auth(request);

        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if let Some(limiter) = &self.rate_limiter {
                limiter.until_ready().await;
            }

            let request_clone = request
                .try_clone()
                .ok_or_else(|| ConnectorError::Internal("Failed to clone request".to_string()))?;

            match request_clone.send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    warn!(
                        connector = %self.config.name,
                        %method,
                        %url,
                        attempt,
                        max_attempts = attempts,
                        delay_secs = self.retry.delay.as_secs(),
                        "Rate limited by remote service"
                    );
                    last_error = "HTTP 429 Too Many Requests".to_string();
                }
                Ok(response) => {
                    debug!(
                        connector = %self.config.name,
                        %method,
                        %url,
                        status = response.status().as_u16(),
                        attempt,
                        "Request completed"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    let err = transport_error(&e);
                    error!(
                        connector = %self.config.name,
                        %method,
                        %url,
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "Request failed at transport level"
                    );
                    last_error = err.to_string();
                }
            }

            if attempt < attempts {
                sleep(self.retry.delay).await;
            }
        }

        Err(ConnectorError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    /// Reads a response body and deserializes it as JSON.
    ///
    /// Non-2xx responses become [`ConnectorError::RequestFailed`] with the
    /// body attached; unparsable bodies become
    /// [`ConnectorError::InvalidResponse`].
    pub async fn read_json<T: DeserializeOwned>(response: Response) -> ConnectorResult<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            ConnectorError::InvalidResponse(format!(
                "Failed to parse response (status {}): {} - Body: {}",
                status,
                e,
                truncate(&text)
            ))
        })
    }

    /// Reads a response into its status code and raw body.
    pub async fn read_text(response: Response) -> ConnectorResult<(u16, String)> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))?;
        Ok((status, text))
    }

    /// Adds authentication to a request.
    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::ApiKey { key, header_name } => {
                request.header(header_name, key.expose_secret())
            }
            AuthConfig::BearerToken { token } => request.bearer_auth(token.expose_secret()),
        }
    }
}

/// Maps a reqwest transport error onto the connector taxonomy.
fn transport_error(e: &reqwest::Error) -> ConnectorError {
    if e.is_timeout() {
        ConnectorError::Timeout(e.to_string())
    } else if e.is_connect() {
        ConnectorError::ConnectionFailed(e.to_string())
    } else {
        ConnectorError::RequestFailed(e.to_string())
    }
}

/// Maps a non-success status onto the connector taxonomy.
fn status_error(status: StatusCode, body: &str) -> ConnectorError {
    match status {
        StatusCode::UNAUTHORIZED => ConnectorError::AuthenticationFailed("Unauthorized".into()),
        StatusCode::FORBIDDEN => ConnectorError::AuthorizationDenied("Forbidden".into()),
        StatusCode::NOT_FOUND => ConnectorError::NotFound("Resource not found".into()),
        StatusCode::TOO_MANY_REQUESTS => ConnectorError::RateLimited(truncate(body)),
        _ => ConnectorError::RequestFailed(format!("HTTP {}: {}", status, truncate(body))),
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(500).collect()
}
