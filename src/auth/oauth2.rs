//! OAuth2 client credentials authenticator
//!
//! Tokens are fetched lazily and cached until shortly before the server says
//! they expire. The cache uses double-checked locking: callers first look under
//! the read lock, and only on a miss take the write lock, look again, and then
//! fetch. Concurrent callers with a cold cache therefore queue on the write
//! lock behind a single token request and reuse its result.

use super::authenticator::set_bearer;
use super::types::CachedToken;
use crate::error::{Error, Result};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, Request, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Timeout for the token request, independent of the caller's request timeout
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Subtracted from `expires_in` so the token is renewed before the server drops it
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Lifetime assumed when the server does not send a usable `expires_in`
const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 55;

/// OAuth2 client credentials authenticator with a shared token cache
pub struct OAuth2ClientCredentials {
    client_id: String,
    client_secret: String,
    token_url: String,
    scopes: Vec<String>,
    /// Cached token; `None` until the first successful fetch
    cached_token: RwLock<Option<CachedToken>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl OAuth2ClientCredentials {
    /// Create a new authenticator; id, secret and token URL must be non-empty
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
        scopes: Vec<String>,
    ) -> Result<Self> {
        Self::with_client(client_id, client_secret, token_url, scopes, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
        scopes: Vec<String>,
        http_client: Client,
    ) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        let token_url = token_url.into();

        if client_id.is_empty() {
            return Err(Error::missing_field("client_id"));
        }
        if client_secret.is_empty() {
            return Err(Error::missing_field("client_secret"));
        }
        if token_url.is_empty() {
            return Err(Error::missing_field("token_url"));
        }

        Ok(Self {
            client_id,
            client_secret,
            token_url,
            scopes,
            cached_token: RwLock::new(None),
            http_client,
        })
    }

    /// Set `Authorization: Bearer <token>`, fetching a token if needed
    pub async fn apply(&self, request: &mut Request) -> Result<()> {
        let token = self.get_or_refresh_token().await?;
        set_bearer(request, &token)
    }

    /// Get a valid token, refreshing if necessary
    pub async fn get_or_refresh_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
                return Ok(token.token.clone());
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
            debug!("Using token refreshed by a concurrent request");
            return Ok(token.token.clone());
        }

        // On failure the previous entry stays in place
        let new_token = self.fetch_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Current cache entry, valid or not
    pub async fn cached_token(&self) -> Option<CachedToken> {
        self.cached_token.read().await.clone()
    }

    /// Drop the cached token so the next request fetches a new one
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Token endpoint this authenticator talks to
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Request a new token from the token endpoint
    async fn fetch_token(&self) -> Result<CachedToken> {
        debug!(token_url = %self.token_url, "Fetching OAuth2 token");

        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
        ];

        if !self.scopes.is_empty() {
            form.push(("scope", self.scopes.join(" ")));
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Token request failed");
                Error::token_fetch(format!("token request failed: {e}"))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Token endpoint rejected the request");
            return Err(Error::token_status(
                status.as_u16(),
                format!("token request failed with status: {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::token_fetch(format!("failed to read token response: {e}")))?;

        let token_response: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::token_fetch(format!("failed to decode token response: {e}")))?;

        if token_response.access_token.is_empty() {
            return Err(Error::token_fetch("no access token in response"));
        }

        let token = token_response.into_cached_token();
        debug!(expires_at = %token.expires_at, "Cached new OAuth2 token");
        Ok(token)
    }
}

impl fmt::Debug for OAuth2ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        let now = Utc::now();
        let expires_at = match self.expires_in {
            Some(secs) if secs > 0 => now + ChronoDuration::seconds(secs - EXPIRY_MARGIN_SECONDS),
            _ => now + ChronoDuration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        };

        CachedToken::new(self.access_token, expires_at)
    }
}
