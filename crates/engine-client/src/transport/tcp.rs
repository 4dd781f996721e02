use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{with_timeout, HttpResponse, PreparedRequest, Transport, TransportError};

/// Transport for engines listening on a TCP port.
///
/// Connections are pooled by `reqwest`. Aborting a response stops the body
/// stream and drops the connection instead of returning it to the pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(limit) = timeout {
            builder = builder.connect_timeout(limit);
        }
        Ok(Self {
            client: builder.build()?,
            timeout,
        })
    }

    async fn exchange(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));
        let (body, handle) = futures_util::stream::abortable(chunks);

        Ok(HttpResponse {
            status,
            content_length,
            body: Box::pin(body),
            connection: Arc::new(handle),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        with_timeout(self.timeout, self.exchange(request)).await
    }
}
