//! HTTP transports that carry engine requests.
//!
//! The client core never touches sockets. It hands a [`PreparedRequest`] to a
//! [`Transport`] and gets back an [`HttpResponse`]: the status, the announced
//! body length, the body as a stream of chunks, and a [`ConnectionControl`]
//! able to tear the connection down early.
//!
//! | Endpoint | Transport | Connection reuse |
//! |----------|-----------|------------------|
//! | `unix://…` | [`UnixSocketTransport`] (hyper HTTP/1 over `UnixStream`) | one connection per request |
//! | `http://…`, `tcp://…` | [`HttpTransport`] (reqwest) | reqwest's pool |
//!
//! The optional timeout bounds connection setup plus the response head. Once
//! a body is streaming no timeout applies, since attach streams may stay open
//! for as long as the container runs.

mod tcp;
mod unix;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use engine::{EngineError, Endpoint};
use futures_util::Stream;
use thiserror::Error;

pub use self::tcp::HttpTransport;
pub use self::unix::UnixSocketTransport;

/// Response body, delivered chunk by chunk in arrival order.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures below HTTP semantics.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The socket could not be opened.
    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        /// Endpoint that refused or could not be reached.
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP/1 exchange over a Unix socket failed (handshake, reset, malformed frame).
    #[error("HTTP exchange failed: {0}")]
    Http(#[from] hyper::Error),

    /// The TCP client failed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The request could not be assembled into an HTTP message.
    #[error("Malformed HTTP request: {0}")]
    Request(#[from] http::Error),

    /// No response head arrived within the configured timeout.
    #[error("No response from engine within {0:?}")]
    Timeout(Duration),
}

impl From<TransportError> for EngineError {
    fn from(error: TransportError) -> Self {
        EngineError::transport(error)
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A fully formed request, ready for the wire.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: http::Method,
    /// `{endpoint}/v{version}/{path}[?query]`, used by TCP transports and logs.
    pub url: String,
    /// `/v{version}/{path}[?query]`, used as the request target on sockets.
    pub path_and_query: String,
    /// Query pairs after absent values were stripped, unencoded.
    pub query: Vec<(String, String)>,
    pub headers: http::HeaderMap,
    pub body: Option<Bytes>,
}

/// Lets a stream consumer close the connection before the engine does.
pub trait ConnectionControl: Send + Sync {
    /// Tears down the underlying connection. Calling it twice is harmless.
    fn abort(&self);
}

impl ConnectionControl for futures_util::stream::AbortHandle {
    fn abort(&self) {
        futures_util::stream::AbortHandle::abort(self);
    }
}

/// An in-flight response whose head has arrived.
pub struct HttpResponse {
    pub status: u16,
    /// Exact body length when the transport knows it up front. `Some(0)`
    /// means the body stream must not be waited on.
    pub content_length: Option<u64>,
    pub body: BodyStream,
    pub connection: Arc<dyn ConnectionControl>,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Submits one request and returns as soon as the response head is available.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError>;
}

/// Picks the transport matching the endpoint's scheme.
pub fn connect(
    endpoint: &Endpoint,
    timeout: Option<Duration>,
) -> Result<Arc<dyn Transport>, TransportError> {
    match endpoint {
        Endpoint::Unix(path) => Ok(Arc::new(UnixSocketTransport::new(path.clone(), timeout))),
        Endpoint::Tcp { .. } => Ok(Arc::new(HttpTransport::new(timeout)?)),
    }
}

/// Applies the optional head timeout to a pending exchange.
async fn with_timeout<F>(
    timeout: Option<Duration>,
    exchange: F,
) -> Result<HttpResponse, TransportError>
where
    F: std::future::Future<Output = Result<HttpResponse, TransportError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .map_err(|_| TransportError::Timeout(limit))?,
        None => exchange.await,
    }
}
