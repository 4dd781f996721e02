//! Shared fixtures: a scripted transport and canned HTTP servers on real sockets.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use engine_client::{
    ConnectionControl, HttpResponse, PreparedRequest, StreamObserver, Transport, TransportError,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tokio::task::JoinHandle;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CountingConnection(AtomicUsize);

impl CountingConnection {
    pub fn aborts(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ConnectionControl for CountingConnection {
    fn abort(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Replays canned responses and records what was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    /// Queues a response whose body arrives as `chunks`; returns the handle
    /// that counts aborts.
    pub fn reply(&self, status: u16, chunks: &[&str]) -> Arc<CountingConnection> {
        let connection = Arc::new(CountingConnection::default());
        let length: usize = chunks.iter().map(|c| c.len()).sum();
        let items: Vec<Result<Bytes, TransportError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect();
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            content_length: Some(length as u64),
            body: Box::pin(futures_util::stream::iter(items)),
            connection: connection.clone(),
        });
        connection
    }

    pub fn reply_json(&self, status: u16, body: serde_json::Value) -> Arc<CountingConnection> {
        self.reply(status, &[&body.to_string()])
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        next.ok_or_else(|| TransportError::Connect {
            endpoint: "scripted".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "script exhausted"),
        })
    }
}

/// Collects observed lines.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<String>>);

impl Recorder {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl StreamObserver for Recorder {
    fn on_line(&self, _origin: &str, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

// ---------------------------------------------------------------------------
// Canned servers
// ---------------------------------------------------------------------------

/// What a canned server writes back.
#[derive(Debug, Clone)]
pub struct Canned {
    /// Status line and headers, without the blank line.
    pub head: String,
    /// Body pieces written with a short pause between them.
    pub pieces: Vec<Vec<u8>>,
    /// Keep the connection open after writing instead of closing it.
    pub hold_open: bool,
}

impl Canned {
    pub fn json(status: &str, body: &str) -> Self {
        Self {
            head: format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close",
                body.len()
            ),
            pieces: vec![body.as_bytes().to_vec()],
            hold_open: false,
        }
    }

    pub fn no_content() -> Self {
        Self {
            head: "HTTP/1.1 204 No Content".to_string(),
            pieces: Vec::new(),
            hold_open: true,
        }
    }

    /// A chunked body; with `endless` the final chunk is never sent.
    pub fn chunked(lines: &[&str], endless: bool) -> Self {
        let mut pieces: Vec<Vec<u8>> = lines
            .iter()
            .map(|l| format!("{:x}\r\n{l}\r\n", l.len()).into_bytes())
            .collect();
        if !endless {
            pieces.push(b"0\r\n\r\n".to_vec());
        }
        Self {
            head: "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked"
                .to_string(),
            pieces,
            hold_open: endless,
        }
    }

    /// Accepts the request and never answers.
    pub fn silent() -> Self {
        Self {
            head: String::new(),
            pieces: Vec::new(),
            hold_open: true,
        }
    }
}

pub fn socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("engine-client-{}.sock", uuid::Uuid::new_v4()))
}

/// Serves one connection on a fresh Unix socket; the handle yields the raw
/// request (head and body) as received.
pub fn serve_unix(path: PathBuf, canned: Canned) -> JoinHandle<String> {
    let listener = UnixListener::bind(&path).expect("bind unix socket");
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let request = answer(stream, canned).await;
        let _ = std::fs::remove_file(&path);
        request
    })
}

/// Serves one connection on an ephemeral loopback port.
pub async fn serve_tcp(canned: Canned) -> (u16, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind tcp");
    let port = listener.local_addr().expect("local addr").port();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        answer(stream, canned).await
    });
    (port, handle)
}

async fn answer<S>(mut stream: S, canned: Canned) -> String
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = read_request(&mut stream).await;

    if !canned.head.is_empty() {
        let _ = stream
            .write_all(format!("{}\r\n\r\n", canned.head).as_bytes())
            .await;
        for piece in &canned.pieces {
            if stream.write_all(piece).await.is_err() {
                return request;
            }
            let _ = stream.flush().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    if canned.hold_open {
        // Until the client hangs up.
        let mut sink = [0u8; 64];
        while let Ok(n) = stream.read(&mut sink).await {
            if n == 0 {
                break;
            }
        }
    }
    request
}

async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(at) = find(&buffer, b"\r\n\r\n") {
            break at + 4;
        }
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return String::from_utf8_lossy(&buffer).into_owned();
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_ascii_lowercase();
    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buffer.len() < head_end + length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
