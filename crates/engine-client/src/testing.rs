//! In-memory transport doubles for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::transport::{
    ConnectionControl, HttpResponse, PreparedRequest, Transport, TransportError,
};

/// Counts abort calls.
#[derive(Debug, Default)]
pub(crate) struct CountingConnection {
    aborts: AtomicUsize,
}

impl CountingConnection {
    pub(crate) fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl ConnectionControl for CountingConnection {
    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

/// A response whose body is delivered as the given chunks, with the length
/// announced up front.
pub(crate) fn response(status: u16, chunks: &[&str]) -> (HttpResponse, Arc<CountingConnection>) {
    let length: usize = chunks.iter().map(|c| c.len()).sum();
    let connection = Arc::new(CountingConnection::default());
    let items: Vec<Result<Bytes, TransportError>> = chunks
        .iter()
        .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
        .collect();
    let response = HttpResponse {
        status,
        content_length: Some(length as u64),
        body: Box::pin(futures_util::stream::iter(items)),
        connection: connection.clone(),
    };
    (response, connection)
}

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn replying(response: HttpResponse) -> Self {
        let transport = Self::default();
        transport
            .responses
            .lock()
            .unwrap()
            .push_back(response);
        transport
    }

    pub(crate) fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Connect {
                endpoint: "scripted".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "no scripted response left",
                ),
            })
    }
}
