//! CLI runner - sends the request and prints the response

use crate::cli::commands::Cli;
use crate::error::{Error, Result};
use crate::http::{timeout_error, HttpClient};
use crate::output::{write_response, ResponseHead};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Send the request and print the response to stdout
    ///
    /// Ctrl-C while waiting for the rate limiter aborts the run.
    pub async fn run(&self) -> Result<()> {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted");
                on_interrupt.cancel();
            }
        });

        let mut stdout = std::io::stdout();
        let result = self.run_with_writer(&mut stdout, &cancel).await;

        watcher.abort();
        result
    }

    /// Send the request and print the response to `out`
    ///
    /// Cancelling during the limiter wait yields [`Error::Cancelled`]; once the
    /// request is in flight it is abandoned with [`Error::Interrupted`].
    pub async fn run_with_writer<W: Write>(
        &self,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let client = HttpClient::with_auth(self.cli.client_config(), &self.cli.auth_config())?;

        if let Some(auth) = client.authenticator() {
            info!(auth = %auth.kind(), "Using authentication");
        }

        let request = self.cli.request_config().build(client.inner()).await?;

        let response = tokio::select! {
            biased;
            result = client.execute_with_cancel(request, self.cli.timeout, cancel) => result?,
            () = cancel.cancelled() => return Err(Error::Interrupted),
        };

        if let Ok(stats) = serde_json::to_string(&client.rate_limiter().stats()) {
            debug!(stats = %stats, "Rate limiter stats");
        }

        let head = ResponseHead::from_response(&response);
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                timeout_error(self.cli.timeout)
            } else {
                Error::body(format!("failed to read response body: {e}"))
            }
        })?;

        let formatter = self.cli.format.formatter();
        write_response(out, &head, &body, formatter.as_ref())
    }
}
