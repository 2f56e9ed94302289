//! Raw spec download.

use std::path::Path;
use std::time::Duration;

use transport::{DynTransport, HttpRequest};

use crate::{PipelineError, Result};

/// Downloads a spec document with a bounded wall-clock timeout.
pub struct Fetcher {
    transport: DynTransport,
    timeout: Duration,
}

impl Fetcher {
    /// Create a fetcher using `transport`, bounding each download by `timeout`.
    pub fn new(transport: DynTransport, timeout: Duration) -> Self { Self { transport, timeout } }

    /// `GET url` and write the body verbatim to `destination`, replacing any
    /// existing file.
    ///
    /// # Errors
    /// - [`PipelineError::Timeout`] if the bound expires (the request is cancelled)
    /// - [`PipelineError::Http`] on any non-2xx status
    /// - [`PipelineError::Network`] on connection failure
    /// - [`PipelineError::Filesystem`] if the file cannot be written
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        tracing::info!("Downloading {}", url);
        let response = self.transport.execute(HttpRequest::get(url).timeout(self.timeout)).await?;

        if !response.is_success() {
            return Err(PipelineError::Http {
                url: url.to_string(),
                status: response.status,
                reason: response.reason,
            });
        }

        tokio::fs::write(destination, response.body.as_bytes())
            .await
            .map_err(|e| PipelineError::filesystem(destination, e))?;
        logging::trace(
            "FETCH",
            &format!("wrote {} bytes to {}", response.body.len(), destination.display()),
        );
        Ok(())
    }
}
