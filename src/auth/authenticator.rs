//! Authenticator implementation
//!
//! Handles applying credentials to outgoing requests. The variant set is
//! closed: at most one of them is built per run, chosen by [`AuthConfig::kind`].

use super::oauth2::OAuth2ClientCredentials;
use super::types::{AuthConfig, AuthKind};
use crate::error::{Error, Result};
use base64::Engine as _;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request};
use std::fmt;
use tracing::debug;

/// Authenticator applies one credential strategy to HTTP requests
#[derive(Debug)]
pub enum Authenticator {
    /// HTTP Basic
    Basic(BasicAuth),
    /// Static bearer token
    Bearer(BearerAuth),
    /// OAuth2 client credentials with a cached token
    OAuth2(OAuth2ClientCredentials),
    /// Arbitrary header
    CustomHeader(CustomHeaderAuth),
}

impl Authenticator {
    /// Build the authenticator a configuration selects, if any
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>> {
        Self::from_config_with_client(config, Client::new())
    }

    /// Build the authenticator a configuration selects, reusing an HTTP client
    /// for token requests
    pub fn from_config_with_client(config: &AuthConfig, http_client: Client) -> Result<Option<Self>> {
        let Some(kind) = config.kind() else {
            return Ok(None);
        };

        debug!(auth = %kind, "Selected authenticator");

        let authenticator = match kind {
            AuthKind::Basic => Self::Basic(BasicAuth::new(&config.username, &config.password)),
            AuthKind::Bearer => Self::Bearer(BearerAuth::new(&config.bearer_token)),
            AuthKind::OAuth2ClientCredentials => Self::OAuth2(OAuth2ClientCredentials::with_client(
                &config.client_id,
                &config.client_secret,
                &config.token_url,
                config.scopes.clone(),
                http_client,
            )?),
            AuthKind::CustomHeader => Self::CustomHeader(CustomHeaderAuth::new(
                &config.custom_header,
                &config.custom_value,
            )),
        };

        Ok(Some(authenticator))
    }

    /// Apply credentials to a request
    ///
    /// Only the OAuth2 variant can fail for reasons other than an
    /// unencodable header; when it does the request is left untouched.
    pub async fn apply(&self, request: &mut Request) -> Result<()> {
        match self {
            Self::Basic(auth) => auth.apply(request),
            Self::Bearer(auth) => auth.apply(request),
            Self::OAuth2(auth) => auth.apply(request).await,
            Self::CustomHeader(auth) => auth.apply(request),
        }
    }

    /// Which strategy this authenticator uses
    pub fn kind(&self) -> AuthKind {
        match self {
            Self::Basic(_) => AuthKind::Basic,
            Self::Bearer(_) => AuthKind::Bearer,
            Self::OAuth2(_) => AuthKind::OAuth2ClientCredentials,
            Self::CustomHeader(_) => AuthKind::CustomHeader,
        }
    }
}

/// HTTP Basic authentication
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// Create a new basic authenticator
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Base64 of `username:password`
    pub fn encode_credentials(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        base64::engine::general_purpose::STANDARD.encode(credentials)
    }

    /// Set `Authorization: Basic ...` when either field is non-empty
    pub fn apply(&self, request: &mut Request) -> Result<()> {
        if self.username.is_empty() && self.password.is_empty() {
            return Ok(());
        }

        let value = sensitive_value(AUTHORIZATION.as_str(), &format!("Basic {}", self.encode_credentials()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Static bearer token authentication
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    /// Create a new bearer authenticator
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Set `Authorization: Bearer <token>` when the token is non-empty
    pub fn apply(&self, request: &mut Request) -> Result<()> {
        if self.token.is_empty() {
            return Ok(());
        }

        set_bearer(request, &self.token)
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Arbitrary header authentication, e.g. `X-Api-Key: ...`
#[derive(Clone)]
pub struct CustomHeaderAuth {
    header: String,
    value: String,
}

impl CustomHeaderAuth {
    /// Create a new custom header authenticator
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            value: value.into(),
        }
    }

    /// Set the header when both name and value are non-empty
    pub fn apply(&self, request: &mut Request) -> Result<()> {
        if self.header.is_empty() || self.value.is_empty() {
            return Ok(());
        }

        let name = HeaderName::from_bytes(self.header.as_bytes())
            .map_err(|e| Error::invalid_header(&self.header, e.to_string()))?;
        let value = sensitive_value(&self.header, &self.value)?;

        request.headers_mut().insert(name, value);
        Ok(())
    }
}

impl fmt::Debug for CustomHeaderAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomHeaderAuth")
            .field("header", &self.header)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Set `Authorization: Bearer <token>`
pub(super) fn set_bearer(request: &mut Request, token: &str) -> Result<()> {
    let value = sensitive_value(AUTHORIZATION.as_str(), &format!("Bearer {token}"))?;
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

fn sensitive_value(name: &str, value: &str) -> Result<HeaderValue> {
    let mut value =
        HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
