//! Auth configuration types
//!
//! These types carry credentials as they arrive from the command line, before
//! an [`Authenticator`](super::Authenticator) variant has been chosen.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Credential settings collected from flags and environment variables
///
/// Empty strings mean "not set". Several groups may be filled in at once;
/// [`AuthConfig::kind`] decides which one wins.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Basic auth username
    pub username: String,
    /// Basic auth password
    pub password: String,
    /// Static bearer token
    pub bearer_token: String,
    /// OAuth2 client identifier
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// OAuth2 token endpoint
    pub token_url: String,
    /// OAuth2 scopes, joined with spaces on the wire
    pub scopes: Vec<String>,
    /// Name of a custom auth header
    pub custom_header: String,
    /// Value of the custom auth header
    pub custom_value: String,
}

/// Which authenticator a configuration selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// HTTP Basic
    Basic,
    /// Static bearer token
    Bearer,
    /// OAuth2 client credentials grant
    OAuth2ClientCredentials,
    /// Arbitrary header
    CustomHeader,
}

impl AuthKind {
    /// Short label for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            AuthKind::Basic => "basic",
            AuthKind::Bearer => "bearer",
            AuthKind::OAuth2ClientCredentials => "oauth2_client_credentials",
            AuthKind::CustomHeader => "custom_header",
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthConfig {
    /// Pick the authenticator kind by precedence:
    /// basic > bearer > oauth2 > custom header > none
    pub fn kind(&self) -> Option<AuthKind> {
        if !self.username.is_empty() || !self.password.is_empty() {
            return Some(AuthKind::Basic);
        }

        if !self.bearer_token.is_empty() {
            return Some(AuthKind::Bearer);
        }

        if !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.token_url.is_empty()
        {
            return Some(AuthKind::OAuth2ClientCredentials);
        }

        if !self.custom_header.is_empty() && !self.custom_value.is_empty() {
            return Some(AuthKind::CustomHeader);
        }

        None
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password_set", &!self.password.is_empty())
            .field("bearer_token_set", &!self.bearer_token.is_empty())
            .field("client_id", &self.client_id)
            .field("client_secret_set", &!self.client_secret.is_empty())
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field("custom_header", &self.custom_header)
            .field("custom_value_set", &!self.custom_value.is_empty())
            .finish()
    }
}

/// Cached access token with expiration
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// First instant at which the token must no longer be used
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + Duration::seconds(seconds);
        Self { token, expires_at }
    }

    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && now < self.expires_at
    }

    /// Whether the token can still be used
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
