//! Request assembly
//!
//! Turns the method, URL, header, query and body settings of a single
//! invocation into a ready-to-send [`reqwest::Request`]. Header and query
//! entries arrive as raw command-line strings and are parsed here.

use crate::error::{Error, Result, ResultExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Request};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;
use url::Url;

/// Configuration for a single request
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// HTTP method, sent as given
    pub method: String,
    /// Target URL
    pub url: String,
    /// Raw `Key: Value` header entries
    pub headers: Vec<String>,
    /// Raw `key=value` query entries
    pub query: Vec<String>,
    /// Literal body, `@filename`, or `-` for stdin
    pub data: Option<String>,
    /// Raw `key=value` / `key=@filename` multipart entries
    pub form: Vec<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: Method::GET.to_string(),
            url: String::new(),
            headers: Vec::new(),
            query: Vec::new(),
            data: None,
            form: Vec::new(),
        }
    }
}

impl RequestConfig {
    /// Create a GET request config for a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the method
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Add a `Key: Value` header entry
    #[must_use]
    pub fn header(mut self, entry: impl Into<String>) -> Self {
        self.headers.push(entry.into());
        self
    }

    /// Add a `key=value` query entry
    #[must_use]
    pub fn query(mut self, entry: impl Into<String>) -> Self {
        self.query.push(entry.into());
        self
    }

    /// Set the body source
    #[must_use]
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Add a multipart entry
    #[must_use]
    pub fn form(mut self, entry: impl Into<String>) -> Self {
        self.form.push(entry.into());
        self
    }

    /// Build the request against a client
    ///
    /// Multipart entries take precedence over `data`. User headers are
    /// applied last, so they replace the multipart `Content-Type`.
    pub async fn build(&self, client: &Client) -> Result<Request> {
        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|e| Error::invalid_value("method", format!("{}: {e}", self.method)))?;

        let mut url = Url::parse(&self.url)?;
        let pairs: Vec<(&str, &str)> = self.query.iter().filter_map(|q| parse_query(q)).collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let headers = parse_headers(&self.headers)?;

        let mut builder = client.request(method, url);

        if !self.form.is_empty() {
            builder = builder.multipart(build_form(&self.form).await?);
        } else if let Some(data) = self.data.as_deref().filter(|d| !d.is_empty()) {
            builder = builder.body(read_data(data).await?);
        }

        let request = builder.headers(headers).build()?;
        debug!(method = %request.method(), url = %request.url(), "Built request");
        Ok(request)
    }
}

/// Split a `Key: Value` entry on the first `:`, trimming both sides
pub fn parse_header(entry: &str) -> Option<(&str, &str)> {
    entry
        .split_once(':')
        .map(|(name, value)| (name.trim(), value.trim()))
}

/// Split a `key=value` entry on the first `=`
pub fn parse_query(entry: &str) -> Option<(&str, &str)> {
    entry.split_once('=')
}

/// Parse header entries; entries without `:` are skipped and later entries
/// replace earlier ones with the same name
fn parse_headers(entries: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (name, value) in entries.iter().filter_map(|e| parse_header(e)) {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_header(name, e.to_string()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e.to_string()))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Resolve the `--data` value into body bytes
async fn read_data(data: &str) -> Result<Vec<u8>> {
    if data == "-" {
        let stdin = BufReader::new(tokio::io::stdin());
        return join_lines(stdin)
            .await
            .map(String::into_bytes)
            .context("failed to read from stdin");
    }

    if let Some(path) = data.strip_prefix('@') {
        return read_file(path).await;
    }

    Ok(data.as_bytes().to_vec())
}

/// Read all lines and re-join them with `\n`, dropping the final newline
pub(crate) async fn join_lines<R: AsyncBufRead + Unpin>(reader: R) -> Result<String> {
    let mut lines = reader.lines();
    let mut collected = Vec::new();

    while let Some(line) = lines.next_line().await? {
        collected.push(line);
    }

    Ok(collected.join("\n"))
}

/// Build a multipart form from `key=value` and `key=@filename` entries
async fn build_form(entries: &[String]) -> Result<Form> {
    let mut form = Form::new();

    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| Error::body(format!("invalid form data format: {entry}")))?;

        match value.strip_prefix('@') {
            Some(path) => {
                let content = read_file(path).await?;
                let file_name = Path::new(path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("file")
                    .to_string();
                let mime_type = mime_guess::from_path(path).first_or_octet_stream();

                let part = Part::bytes(content)
                    .file_name(file_name)
                    .mime_str(mime_type.as_ref())?;

                form = form.part(key.to_string(), part);
            }
            None => {
                form = form.text(key.to_string(), value.to_string());
            }
        }
    }

    Ok(form)
}

async fn read_file(path: &str) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FileNotFound {
            path: path.to_string(),
        }),
        Err(e) => Err(e).with_context(|| format!("failed to read file {path}")),
    }
}
