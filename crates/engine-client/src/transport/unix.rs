use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use http::header::HOST;
use http_body_util::{BodyExt, Full};
use hyper::body::Body as _;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tokio::task::JoinHandle;
use tracing::warn;

use super::{
    with_timeout, ConnectionControl, HttpResponse, PreparedRequest, Transport, TransportError,
};

/// Transport for engines listening on a Unix domain socket.
///
/// Every request opens its own connection; a spawned task drives it until the
/// body has been delivered or the consumer aborts.
#[derive(Debug, Clone)]
pub struct UnixSocketTransport {
    path: PathBuf,
    timeout: Option<Duration>,
}

/// Handle on the task driving one socket connection.
struct ConnectionTask(JoinHandle<()>);

impl ConnectionControl for ConnectionTask {
    fn abort(&self) {
        self.0.abort();
    }
}

/// Aborts the connection task if the exchange is abandoned before a response
/// head arrives (timeout, send failure, dropped future).
struct PendingConnection {
    task: Arc<ConnectionTask>,
    armed: bool,
}

impl PendingConnection {
    fn new(task: JoinHandle<()>) -> Self {
        Self {
            task: Arc::new(ConnectionTask(task)),
            armed: true,
        }
    }

    fn established(mut self) -> Arc<ConnectionTask> {
        self.armed = false;
        self.task.clone()
    }
}

impl Drop for PendingConnection {
    fn drop(&mut self) {
        if self.armed {
            self.task.abort();
        }
    }
}

impl UnixSocketTransport {
    pub fn new(path: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn exchange(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        let stream =
            UnixStream::connect(&self.path)
                .await
                .map_err(|source| TransportError::Connect {
                    endpoint: format!("unix://{}", self.path.display()),
                    source,
                })?;

        let (mut sender, connection) =
            hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        let pending = PendingConnection::new(tokio::spawn(async move {
            if let Err(error) = connection.await {
                warn!(%error, "engine socket connection terminated with error");
            }
        }));

        let mut outgoing = http::Request::builder()
            .method(request.method)
            .uri(request.path_and_query)
            .body(Full::new(request.body.unwrap_or_else(Bytes::new)))?;
        outgoing.headers_mut().extend(request.headers);
        // HTTP/1.1 needs a Host; a socket has no authority of its own.
        outgoing
            .headers_mut()
            .insert(HOST, http::HeaderValue::from_static("localhost"));

        let response = sender.send_request(outgoing).await?;
        let status = response.status().as_u16();
        let content_length = response.body().size_hint().exact();
        let body = response
            .into_body()
            .into_data_stream()
            .map(|chunk| chunk.map_err(TransportError::from));

        Ok(HttpResponse {
            status,
            content_length,
            body: Box::pin(body),
            connection: pending.established(),
        })
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        with_timeout(self.timeout, self.exchange(request)).await
    }
}
