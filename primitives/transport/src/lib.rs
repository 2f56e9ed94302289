#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `halycon-transport`: HTTP Abstraction for the Generator Pipeline
//!
//! This crate defines the **transport seam** between the pipeline and the
//! network. The pipeline talks to two remote parties (the upstream model
//! repository and the conversion service), and both are reached exclusively
//! through the [`Transport`] trait defined here.
//!
//! ## Core Concepts
//!
//! ### `Transport` Trait
//! Executes a single [`HttpRequest`] and returns the raw [`HttpResponse`].
//! Non-2xx statuses are **not** errors at this layer; callers decide what a
//! status means. Errors are reserved for the request never completing.
//!
//! ### `TransportError`
//! Distinguishes a request that exceeded its wall-clock bound
//! ([`TransportError::Timeout`]) from one that failed at the connection or
//! body level.
//!
//! ### `DynTransport`
//! A type-erased (`Arc<dyn Transport>`) handle so the pipeline can be driven
//! by the real HTTP backend (`halycon-http`) or by a scripted fake in tests.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use transport::{DynTransport, HttpRequest, TransportError};
//!
//! async fn demo(transport: DynTransport) -> Result<(), TransportError> {
//!     let request = HttpRequest::get("https://example.com/spec.json")
//!         .timeout(Duration::from_secs(60));
//!     let response = transport.execute(request).await?;
//!     println!("{} {}", response.status, response.body.len());
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Type alias for structured error handling in transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Default wall-clock bound applied when a request does not set its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Canonical error type for all transport implementations.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The request did not complete within its wall-clock bound and was cancelled.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL.
        url: String,
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// Connection-level failure (DNS, refused connection, TLS, protocol error).
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// The response body could not be read or decoded as text.
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Any other error not covered by the specific variants above.
    #[error("Other error: {0}")]
    Other(String),
}

/// HTTP verbs used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A fully described outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute target URL, query string included.
    pub url: String,
    /// Request headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Optional request body, sent verbatim.
    pub body: Option<String>,
    /// Wall-clock bound covering connect, send and full body read.
    pub timeout: Duration,
}

impl HttpRequest {
    /// A `GET` request with the default timeout.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A `POST` request carrying `body`, with the default timeout.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the wall-clock bound.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Case-insensitive header lookup (first match).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// A completed response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase (canonical for the status when the server sends none).
    pub reason: String,
    /// Full response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Build a response; mostly useful for fakes.
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self { status, reason: reason.into(), body: body.into() }
    }

    /// Shorthand for a `200 OK` with `body`.
    pub fn ok(body: impl Into<String>) -> Self { Self::new(200, "OK", body) }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// The base transport trait.
///
/// Implementations must enforce [`HttpRequest::timeout`] as a wall-clock
/// bound and cancel the in-flight request when it expires, reporting
/// [`TransportError::Timeout`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request` and return the response, regardless of status code.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Short human-readable name of the backend, used in logs.
    fn name(&self) -> &str;
}

/// Type alias for a shared, dynamically dispatched transport instance.
///
/// ```
/// use transport::DynTransport;
///
/// fn describe(t: &DynTransport) -> String { format!("using {}", t.name()) }
/// ```
pub type DynTransport = Arc<dyn Transport>;

/// Gets a random free port assigned by the OS.
///
/// This function binds to `127.0.0.1:0`, which causes the OS to assign
/// an available port. The listener is then dropped and the port number
/// is returned.
///
/// # Errors
///
/// Returns an error if binding to the address fails.
pub fn get_random_free_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
