//! Spec format conversion.
//!
//! The generator wants YAML; upstream publishes JSON. Conversion goes
//! through a remote service in two strategies:
//!
//! 1. **Remote URL**: `GET {base}/convert?url=<spec url>`, letting the
//!    service fetch the spec itself. An empty or whitespace-only body is a
//!    failure.
//! 2. **Local content**: if (1) fails for any reason, `POST {base}/convert`
//!    with the previously downloaded JSON as the body. Its output is not
//!    inspected here.
//!
//! Callers must run [`verify_converted`] afterwards: strategy 2 can succeed
//! with an empty body.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use transport::{DynTransport, HttpRequest};

use crate::{PipelineError, Result};

const YAML_MEDIA_TYPE: &str = "application/yaml";
const JSON_MEDIA_TYPE: &str = "application/json";

/// Which strategy produced the converted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStrategy {
    /// The service fetched the spec by URL.
    RemoteUrl,
    /// The local copy was posted to the service.
    LocalContent,
}

/// Client for the conversion service.
pub struct Converter {
    transport: DynTransport,
    base_url: String,
    timeout: Duration,
}

impl Converter {
    /// `base_url` is the service root; `/convert` is appended.
    pub fn new(transport: DynTransport, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { transport, base_url, timeout }
    }

    /// The conversion endpoint.
    pub fn endpoint(&self) -> String { format!("{}/convert", self.base_url) }

    /// The remote-URL strategy's request URL for `spec_url`.
    pub fn remote_url(&self, spec_url: &str) -> String {
        format!("{}?url={}", self.endpoint(), urlencoding::encode(spec_url))
    }

    /// Convert the spec at `spec_url` (downloaded to `local_spec`) and write
    /// the result to `destination`.
    ///
    /// # Errors
    /// [`PipelineError::Conversion`] carrying both strategies' errors when
    /// neither succeeds; [`PipelineError::Filesystem`] if the result cannot
    /// be written.
    pub async fn convert(
        &self,
        spec_url: &str,
        local_spec: &Path,
        destination: &Path,
    ) -> Result<ConversionStrategy> {
        let (content, strategy) = match self.convert_remote(spec_url, destination).await {
            Ok(content) => (content, ConversionStrategy::RemoteUrl),
            Err(primary) => {
                tracing::warn!("Remote conversion failed ({}), posting local copy instead", primary);
                match self.convert_local(local_spec).await {
                    Ok(content) => (content, ConversionStrategy::LocalContent),
                    Err(fallback) => {
                        return Err(PipelineError::Conversion {
                            primary: Box::new(primary),
                            fallback: Box::new(fallback),
                        })
                    }
                }
            }
        };

        tokio::fs::write(destination, content.as_bytes())
            .await
            .map_err(|e| PipelineError::filesystem(destination, e))?;
        Ok(strategy)
    }

    async fn convert_remote(&self, spec_url: &str, destination: &Path) -> Result<String> {
        let url = self.remote_url(spec_url);
        let request =
            HttpRequest::get(&url).header("Accept", YAML_MEDIA_TYPE).timeout(self.timeout);
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Err(PipelineError::Http { url, status: response.status, reason: response.reason });
        }
        if response.body.trim().is_empty() {
            return Err(PipelineError::EmptyContent { path: destination.to_path_buf() });
        }
        Ok(response.body)
    }

    async fn convert_local(&self, local_spec: &Path) -> Result<String> {
        let content = tokio::fs::read_to_string(local_spec)
            .await
            .map_err(|e| PipelineError::filesystem(local_spec, e))?;

        let url = self.endpoint();
        let request = HttpRequest::post(&url, content)
            .header("Accept", YAML_MEDIA_TYPE)
            .header("Content-Type", JSON_MEDIA_TYPE)
            .timeout(self.timeout);
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Err(PipelineError::Http { url, status: response.status, reason: response.reason });
        }
        Ok(response.body)
    }
}

/// Fail with [`PipelineError::EmptyContent`] unless `path` exists and is
/// non-empty.
pub async fn verify_converted(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(PipelineError::EmptyContent { path: PathBuf::from(path) }),
    }
}
