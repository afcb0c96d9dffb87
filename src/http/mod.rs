//! HTTP client module
//!
//! Builds requests from command-line settings and sends them through the
//! rate limiter and authenticator.
//!
//! # Features
//!
//! - **Request assembly**: headers, query parameters, raw or multipart bodies
//! - **Rate limiting**: token bucket wait bounded by the request timeout
//! - **Authentication**: credentials applied just before dispatch

mod client;
mod request;

pub(crate) use client::timeout_error;
pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use request::{parse_header, parse_query, RequestConfig};
