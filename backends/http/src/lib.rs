#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `halycon-http`: HTTP Transport Backend for halycon-gen
//!
//! This crate provides a concrete HTTP-based implementation of the
//! [`transport::Transport`] trait, used to download upstream API models and
//! to talk to the conversion service.
//!
//! ## Overview
//!
//! - Implements [`HttpTransport`], a thin wrapper over [`reqwest::Client`]
//! - Enforces each request's wall-clock timeout with [`tokio::time::timeout`];
//!   the in-flight request future is dropped (cancelled) when it expires
//! - Returns every completed response, whatever its status; status policy
//!   belongs to the caller
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use halycon_http::HttpTransport;
//! use transport::{HttpRequest, Transport};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let transport = HttpTransport::new();
//! let request = HttpRequest::get("https://converter.swagger.io/api/convert?url=...")
//!     .header("Accept", "application/yaml")
//!     .timeout(Duration::from_secs(120));
//! let response = transport.execute(request).await.unwrap();
//! println!("{} ({} bytes)", response.status, response.body.len());
//! # });
//! ```

use async_trait::async_trait;
use transport::{HttpRequest, HttpResponse, Method, Transport, TransportError};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("halycon-gen/", env!("CARGO_PKG_VERSION"));

/// A concrete implementation of the [`Transport`] trait using HTTP.
///
/// Errors encountered while connecting or reading the body are normalized
/// into [`TransportError`] variants; an expired deadline always surfaces as
/// [`TransportError::Timeout`].
#[derive(Clone, Default)]
pub struct HttpTransport {
    /// The underlying HTTP client used to perform requests.
    client: reqwest::Client,
}

impl HttpTransport {
    /// Constructs a transport with the crate's user agent.
    ///
    /// Falls back to a default client if the builder cannot be finalized.
    pub fn new() -> Self {
        logging::trace("HTTP", "→ initializing HTTP transport");
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Sends `request` and reads the full body as text.
    ///
    /// # Errors
    /// - [`TransportError::Timeout`] if the request does not complete within `request.timeout`
    /// - [`TransportError::Http`] if the connection or send fails
    /// - [`TransportError::Body`] if the body cannot be read
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        logging::trace("HTTP", &format!("→ {} {}", request.method, request.url));
        let HttpRequest { method, url, headers, body, timeout } = request;

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let exchange = async {
            let resp = builder.send().await.map_err(|e| {
                tracing::error!("HTTP Transport - Request failed: {}", e);
                TransportError::Http(e.to_string())
            })?;

            let status = resp.status();
            let text = resp.text().await.map_err(|e| {
                tracing::error!("HTTP Transport - Failed to read body: {}", e);
                TransportError::Body(e.to_string())
            })?;

            Ok(HttpResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body: text,
            })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => {
                if let Ok(response) = &result {
                    logging::trace(
                        "HTTP",
                        &format!("← {} {} ({} bytes)", response.status, url, response.body.len()),
                    );
                }
                result
            }
            Err(_) => {
                tracing::warn!("HTTP Transport - {} {} cancelled after {:?}", method, url, timeout);
                Err(TransportError::Timeout { url, timeout })
            }
        }
    }

    fn name(&self) -> &str { "http" }
}
