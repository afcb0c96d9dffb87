//! Authentication module
//!
//! Supports: Basic, Bearer, OAuth2 client credentials, custom header
//!
//! [`Authenticator`] is a closed set of strategies picked from an
//! [`AuthConfig`] by fixed precedence. The OAuth2 variant caches its access
//! token and refreshes it when it expires.

mod authenticator;
mod oauth2;
mod types;

pub use authenticator::{Authenticator, BasicAuth, BearerAuth, CustomHeaderAuth};
pub use oauth2::{OAuth2ClientCredentials, TOKEN_REQUEST_TIMEOUT};
pub use types::{AuthConfig, AuthKind, CachedToken};
