//! Response writer
//!
//! Prints a response as a status line, one line per header value, a blank
//! line, and then the formatted body.

use super::formatter::ResponseFormatter;
use crate::error::Result;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Response, StatusCode, Version};
use std::io::Write;

/// Status line and headers of a response
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// Protocol version
    pub version: Version,
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// Capture the head of a response before its body is consumed
    pub fn from_response(response: &Response) -> Self {
        Self {
            version: response.version(),
            status: response.status(),
            headers: response.headers().clone(),
        }
    }

    /// `HTTP/1.1 200 OK`
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{:?} {} {reason}", self.version, self.status.as_u16()),
            None => format!("{:?} {}", self.version, self.status.as_u16()),
        }
    }

    /// The `Content-Type` header, if present and readable
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Write the head, a blank line, and the formatted body
pub fn write_response<W: Write>(
    out: &mut W,
    head: &ResponseHead,
    body: &[u8],
    formatter: &dyn ResponseFormatter,
) -> Result<()> {
    writeln!(out, "{}", head.status_line())?;

    for (name, value) in &head.headers {
        writeln!(
            out,
            "{}: {}",
            canonical_header_name(name.as_str()),
            String::from_utf8_lossy(value.as_bytes())
        )?;
    }
    writeln!(out)?;

    let formatted = formatter.format_body(head.content_type(), body);
    out.write_all(&formatted)?;
    out.flush()?;

    Ok(())
}

/// `content-type` -> `Content-Type`
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
