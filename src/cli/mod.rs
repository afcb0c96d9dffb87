//! CLI module
//!
//! Command-line interface: `reqline [OPTIONS] <URL>` sends one request and
//! prints the response status, headers and body to stdout.

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;
