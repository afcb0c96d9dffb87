// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # reqline
//!
//! A command-line HTTP client with token-bucket rate limiting and pluggable
//! authentication.
//!
//! ## Features
//!
//! - **Request assembly**: method, headers, query parameters, raw or multipart bodies
//! - **Rate limiting**: token bucket with blocking waits and runtime reconfiguration
//! - **Multiple Auth Types**: Basic, Bearer, custom header, OAuth2 client credentials
//! - **Response printing**: raw or pretty-printed JSON/XML bodies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reqline::auth::AuthConfig;
//! use reqline::http::{HttpClient, HttpClientConfig, RequestConfig};
//!
//! #[tokio::main]
//! async fn main() -> reqline::Result<()> {
//!     let config = HttpClientConfig::builder().rate("10/s").build();
//!     let auth = AuthConfig {
//!         bearer_token: "secret".to_string(),
//!         ..AuthConfig::default()
//!     };
//!     let client = HttpClient::with_auth(config, &auth)?;
//!
//!     let request = RequestConfig::new("https://api.example.com/items")
//!         .query("page=1")
//!         .build(client.inner())
//!         .await?;
//!     let response = client.send(request).await?;
//!     println!("{}", response.status());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 CLI  (flags → configs)                   │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────┬─────────────┴──────────────┬──────────────┐
//! │  RateLimiter │        Authenticator       │    Output    │
//! ├──────────────┼────────────────────────────┼──────────────┤
//! │ Token bucket │ Basic, Bearer, Header      │ Raw          │
//! │ Wait/Allow   │ OAuth2 (cached token)      │ Pretty JSON  │
//! │ SetRate      │                            │ Pretty XML   │
//! └──────────────┴────────────────────────────┴──────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Token bucket rate limiting
pub mod ratelimit;

/// Authentication implementations
pub mod auth;

/// HTTP client and request assembly
pub mod http;

/// Response printing
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

// Re-export commonly used types
pub use auth::{AuthConfig, Authenticator};
pub use http::{HttpClient, HttpClientConfig, RequestConfig};
pub use ratelimit::{RateLimiter, RateLimiterStats, RateSpec};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
