//! Output module
//!
//! Prints HTTP responses to a writer.
//!
//! # Overview
//!
//! - [`write_response`] prints the status line, headers and body
//! - [`RawFormatter`] leaves the body as received
//! - [`PrettyFormatter`] re-indents JSON and XML bodies

mod formatter;
mod writer;

pub use formatter::{OutputFormat, PrettyFormatter, RawFormatter, ResponseFormatter};
pub use writer::{canonical_header_name, write_response, ResponseHead};
