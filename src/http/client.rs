//! HTTP client with rate limiting and authentication
//!
//! Every request goes through the same pipeline:
//! 1. Wait for the rate limiter, bounded by the request timeout
//! 2. Apply the configured authenticator
//! 3. Send with whatever is left of the timeout

use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::ratelimit::RateLimiter;
use reqwest::{Client, Request, Response};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Default timeout covering the limiter wait and the request
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Rate specification such as `10/s`; `None` disables limiting
    pub rate: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("reqline/{}", env!("CARGO_PKG_VERSION")),
            rate: None,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the rate specification
    pub fn rate(mut self, rate: impl Into<String>) -> Self {
        self.config.rate = Some(rate.into());
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with rate limiting and authentication
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: RateLimiter,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        let rate_limiter = RateLimiter::new(config.rate.as_deref().unwrap_or_default())?;

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: &AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.set_auth(auth_config)?;
        Ok(client)
    }

    /// Select an authenticator from credentials; token requests reuse this client
    pub fn set_auth(&mut self, auth_config: &AuthConfig) -> Result<()> {
        self.authenticator =
            Authenticator::from_config_with_client(auth_config, self.client.clone())?;
        Ok(())
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// The rate limiter gating this client
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// The selected authenticator, if any
    pub fn authenticator(&self) -> Option<&Authenticator> {
        self.authenticator.as_ref()
    }

    /// Send a request with the configured timeout
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.execute(request, self.config.timeout).await
    }

    /// Send a request within `timeout`
    pub async fn execute(&self, request: Request, timeout: Duration) -> Result<Response> {
        self.execute_with_cancel(request, timeout, &CancellationToken::new())
            .await
    }

    /// Send a request within `timeout`, giving up on the limiter wait early if
    /// `cancel` fires
    ///
    /// The limiter wait and the request share one deadline. Running out of
    /// time while waiting yields [`Error::Cancelled`]; running out while the
    /// request is in flight yields [`Error::Timeout`].
    pub async fn execute_with_cancel(
        &self,
        mut request: Request,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        // None means the timeout is too large to represent, so nothing is bounded
        let deadline = Instant::now().checked_add(timeout);

        match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.rate_limiter.wait(cancel)).await {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!(timeout = ?timeout, "Timed out waiting for rate limiter");
                        return Err(Error::Cancelled);
                    }
                }
            }
            None => self.rate_limiter.wait(cancel).await?,
        }

        if let Some(auth) = &self.authenticator {
            auth.apply(&mut request).await?;
        }

        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout_error(timeout));
            }
            *request.timeout_mut() = Some(remaining);
        }

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "Sending request");

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                timeout_error(timeout)
            } else {
                Error::Http(e)
            }
        })?;

        debug!(%method, %url, status = response.status().as_u16(), "Received response");
        Ok(response)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator.as_ref().map(Authenticator::kind))
            .field("rate_limiter", &self.rate_limiter.stats())
            .finish_non_exhaustive()
    }
}

/// Timeout error carrying `timeout` in milliseconds, saturating at `u64::MAX`
pub(crate) fn timeout_error(timeout: Duration) -> Error {
    Error::Timeout {
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}
