//! CLI arguments and their mapping onto client configuration

use crate::auth::AuthConfig;
use crate::http::{HttpClientConfig, RequestConfig};
use crate::output::OutputFormat;
use clap::Parser;
use std::time::Duration;

/// Command-line HTTP client with rate limiting and pluggable authentication
#[derive(Parser, Debug)]
#[command(name = "reqline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target URL
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Header in 'Key: Value' format (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Query parameter in 'key=value' format (repeatable)
    #[arg(short, long = "query", value_name = "PARAM")]
    pub query: Vec<String>,

    /// Request body: a string, @filename, or - for stdin
    #[arg(short, long)]
    pub data: Option<String>,

    /// Multipart field in 'key=value' or 'key=@filename' format (repeatable)
    #[arg(short, long = "form", value_name = "FIELD")]
    pub form: Vec<String>,

    /// Timeout covering the rate limiter wait and the request
    #[arg(short, long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Rate limit such as 10/s, 100/30s or 1000/h
    #[arg(long, env = "REQLINE_RATE")]
    pub rate: Option<String>,

    /// Basic auth username
    #[arg(short, long, env = "REQLINE_USERNAME", default_value = "")]
    pub username: String,

    /// Basic auth password
    #[arg(short, long, env = "REQLINE_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Bearer token
    #[arg(long, env = "REQLINE_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// OAuth2 client ID
    #[arg(long, env = "REQLINE_CLIENT_ID", default_value = "")]
    pub client_id: String,

    /// OAuth2 client secret
    #[arg(long, env = "REQLINE_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub client_secret: String,

    /// OAuth2 token endpoint
    #[arg(long, env = "REQLINE_TOKEN_URL", default_value = "")]
    pub token_url: String,

    /// OAuth2 scope (repeatable or comma separated)
    #[arg(long = "scope", value_delimiter = ',')]
    pub scopes: Vec<String>,

    /// Name of a custom auth header
    #[arg(long, env = "REQLINE_AUTH_HEADER", default_value = "")]
    pub auth_header: String,

    /// Value of the custom auth header
    #[arg(long, env = "REQLINE_AUTH_VALUE", default_value = "", hide_env_values = true)]
    pub auth_value: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Credentials from flags and environment
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            bearer_token: self.token.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_url: self.token_url.clone(),
            scopes: self
                .scopes
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            custom_header: self.auth_header.clone(),
            custom_value: self.auth_value.clone(),
        }
    }

    /// Client settings
    pub fn client_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder().timeout(self.timeout);

        match self.rate.as_deref().filter(|r| !r.is_empty()) {
            Some(rate) => builder.rate(rate).build(),
            None => builder.no_rate_limit().build(),
        }
    }

    /// Request settings
    pub fn request_config(&self) -> RequestConfig {
        RequestConfig {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            query: self.query.clone(),
            data: self.data.clone(),
            form: self.form.clone(),
        }
    }
}
